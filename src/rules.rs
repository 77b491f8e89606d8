use log::debug;

use crate::error::SourceQueryError;
use crate::parse::{get_string, get_u16};

/// A server rule (usually a console variable) from an A2S_RULES response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub value: String,
}

impl Rule {
    /// Parse the body of an A2S_RULES response (everything after the `E` header).
    ///
    /// Like [crate::player::Player::parse_list], a packet that ends between two rules is accepted.
    pub fn parse_list(data: &[u8]) -> Result<Vec<Rule>, SourceQueryError> {
        let mut offset: usize = 0;
        let count: u16 = get_u16(data, &mut offset)?;

        let mut rules: Vec<Rule> = Vec::with_capacity(count as usize);
        while rules.len() < count as usize && offset < data.len() {
            let name: String = get_string(data, &mut offset)?;
            let value: String = get_string(data, &mut offset)?;
            rules.push(Rule { name, value });
        }

        if rules.len() < count as usize {
            debug!("A2S_RULES declared {} rules but listed {}", count, rules.len());
        }

        Ok(rules)
    }
}
