mod heal;
mod smite;

pub use heal::{Heal, heal};
pub use smite::{Smite, smite};

/// Wraps an amount in the healing color marker.
pub(crate) fn healing_markup(amount: u32) -> String {
    format!("<ansi fg=\"healing\">{amount} hitpoints</ansi>")
}
