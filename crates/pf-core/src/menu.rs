//! Resolution of algorithm short lists against the trigger menu.

use pf_config::monitor::TriggerMenu;
use tracing::warn;

use crate::logging::event_names;

/// An algorithm from a short list that exists in the menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAlgo {
    pub name: String,
    pub bit: usize,
}

impl ResolvedAlgo {
    /// Axis label, `"<name> (<bit>)"`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.name, self.bit)
    }
}

/// Look up every name of `short_list` in `menu`, keeping list order.
///
/// Names missing from the menu are logged and dropped.
pub fn resolve_short_list(menu: &TriggerMenu, short_list: &[String]) -> Vec<ResolvedAlgo> {
    short_list
        .iter()
        .filter_map(|name| match menu.bit_for(name) {
            Some(bit) => Some(ResolvedAlgo {
                name: name.clone(),
                bit,
            }),
            None => {
                warn!(
                    target: event_names::MENU_ALGO_UNKNOWN,
                    algo = %name,
                    menu = %menu.name,
                    "Algo \"{}\" not found in the trigger menu {}. Could not retrieve algo bit number.",
                    name,
                    menu.name
                );
                None
            }
        })
        .collect()
}
