/*!

Stands in for the `log4rs` logger when the `logging` feature is off. Filters are still tracked but
only the global level reaches the `log` facade, and no message is written anywhere.

*/

use crate::log::LogConfiguration;

impl LogConfiguration {
    pub(in crate::log) fn set_config(&mut self) {
        log::set_max_level(self.global_log_level);
    }
}
