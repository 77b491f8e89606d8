use log::debug;

use crate::error::SourceQueryError;
use crate::parse::{get_f32, get_i32, get_string, get_u8};

/// A single player entry of an A2S_PLAYER response.
#[derive(Debug, Clone, PartialEq)]
pub struct Player {
    /// Index of the player chunk; many servers always send 0
    pub index: u8,
    pub name: String,
    /// Score (usually kills)
    pub score: i32,
    /// Seconds connected to the server
    pub duration: f32,
}

impl Player {
    fn decode(data: &[u8], offset: &mut usize) -> Result<Player, SourceQueryError> {
        Ok(Player {
            index: get_u8(data, offset)?,
            name: get_string(data, offset)?,
            score: get_i32(data, offset)?,
            duration: get_f32(data, offset)?,
        })
    }

    /// Parse the body of an A2S_PLAYER response (everything after the `D` header).
    ///
    /// Stops early if the packet ends cleanly between two players, since some
    /// servers report more players than they list. A player cut off halfway is an error.
    pub fn parse_list(data: &[u8]) -> Result<Vec<Player>, SourceQueryError> {
        let mut offset: usize = 0;
        let count: u8 = get_u8(data, &mut offset)?;

        let mut players: Vec<Player> = Vec::with_capacity(count as usize);
        while players.len() < count as usize && offset < data.len() {
            players.push(Self::decode(data, &mut offset)?);
        }

        if players.len() < count as usize {
            debug!("A2S_PLAYER declared {} players but listed {}", count, players.len());
        }

        Ok(players)
    }
}
