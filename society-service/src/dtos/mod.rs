pub mod setup;
pub mod society;

use serde::Deserialize;

/// `?key=` query parameter carried by setup links.
#[derive(Debug, Default, Deserialize)]
pub struct KeyQuery {
    pub key: Option<String>,
}
