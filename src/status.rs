//! Per-node state arrays.
//!
//! Each array is indexed by node. Counts of immune, actively vaccinated and
//! pro-vaccine nodes are kept up to date by the setters so progress reports
//! never scan the population.

use crate::NodeId;

#[derive(Clone, Debug, PartialEq)]
pub struct NodeStatus {
    immune: Vec<bool>,
    active_vax: Vec<bool>,
    pro_vax: Vec<bool>,
    /// Worst severity each node has experienced, zero if never infected.
    severity: Vec<f64>,
    immune_count: usize,
    active_vax_count: usize,
    pro_vax_count: usize,
}

impl NodeStatus {
    /// Everyone starts susceptible, unvaccinated, anti-vaccine and with no
    /// severity history.
    #[must_use]
    pub fn new(nodes: usize) -> Self {
        NodeStatus {
            immune: vec![false; nodes],
            active_vax: vec![false; nodes],
            pro_vax: vec![false; nodes],
            severity: vec![0.0; nodes],
            immune_count: 0,
            active_vax_count: 0,
            pro_vax_count: 0,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.immune.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.immune.is_empty()
    }

    #[must_use]
    pub fn is_immune(&self, node: NodeId) -> bool {
        self.immune[node]
    }

    /// Returns whether the flag changed.
    pub fn set_immune(&mut self, node: NodeId, immune: bool) -> bool {
        update_flag(&mut self.immune, &mut self.immune_count, node, immune)
    }

    #[must_use]
    pub fn has_active_vax(&self, node: NodeId) -> bool {
        self.active_vax[node]
    }

    /// Returns whether the flag changed.
    pub fn set_active_vax(&mut self, node: NodeId, active: bool) -> bool {
        update_flag(&mut self.active_vax, &mut self.active_vax_count, node, active)
    }

    #[must_use]
    pub fn is_pro_vax(&self, node: NodeId) -> bool {
        self.pro_vax[node]
    }

    /// Returns whether the opinion changed.
    pub fn set_pro_vax(&mut self, node: NodeId, pro_vax: bool) -> bool {
        update_flag(&mut self.pro_vax, &mut self.pro_vax_count, node, pro_vax)
    }

    #[must_use]
    pub fn severity(&self, node: NodeId) -> f64 {
        self.severity[node]
    }

    /// Raises the node's severity to `severity` if that is worse than its
    /// history. Severity never decreases.
    pub fn raise_severity(&mut self, node: NodeId, severity: f64) -> bool {
        if severity > self.severity[node] {
            self.severity[node] = severity;
            true
        } else {
            false
        }
    }

    #[must_use]
    pub fn opinions(&self) -> &[bool] {
        &self.pro_vax
    }

    #[must_use]
    pub fn severities(&self) -> &[f64] {
        &self.severity
    }

    #[must_use]
    pub fn immune_count(&self) -> usize {
        self.immune_count
    }

    #[must_use]
    pub fn active_vax_count(&self) -> usize {
        self.active_vax_count
    }

    #[must_use]
    pub fn pro_vax_count(&self) -> usize {
        self.pro_vax_count
    }
}

fn update_flag(flags: &mut [bool], count: &mut usize, node: NodeId, value: bool) -> bool {
    if flags[node] == value {
        return false;
    }
    flags[node] = value;
    if value {
        *count += 1;
    } else {
        *count -= 1;
    }
    true
}
