use log::trace;

use crate::error::SourceQueryError;
use crate::parse::{get_string, get_u16, get_u64, get_u8};

/// Server type, as reported by A2S_INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerType {
    /// `d`
    Dedicated,
    /// `l` (listen server)
    NonDedicated,
    /// `p` (proxy)
    SourceTvRelay,
}

impl TryFrom<u8> for ServerType {
    type Error = SourceQueryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        // GoldSource servers send these in upper case
        match value.to_ascii_lowercase() {
            b'd' => Ok(ServerType::Dedicated),
            b'l' => Ok(ServerType::NonDedicated),
            b'p' => Ok(ServerType::SourceTvRelay),
            _ => Err(SourceQueryError::UnknownServerType(value)),
        }
    }
}

/// Server operating system, as reported by A2S_INFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Linux,
    Windows,
    Mac,
}

impl TryFrom<u8> for Environment {
    type Error = SourceQueryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase() {
            b'l' => Ok(Environment::Linux),
            b'w' => Ok(Environment::Windows),
            b'm' | b'o' => Ok(Environment::Mac),
            _ => Err(SourceQueryError::UnknownEnvironment(value)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    /// Password protected.
    Private,
}

impl TryFrom<u8> for Visibility {
    type Error = SourceQueryError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Visibility::Public),
            1 => Ok(Visibility::Private),
            n => Err(SourceQueryError::UnknownVisibility(n)),
        }
    }
}

/// Extra fields sent only by servers running *The Ship* (app id 2400).
#[derive(Debug, Clone, PartialEq)]
pub struct ShipInfo {
    /// Game mode (hunt, elimination, duel, deathmatch, ...)
    pub mode: u8,
    /// Number of witnesses needed to arrest a player
    pub witnesses: u8,
    /// Seconds before a player is arrested while being witnessed
    pub duration: u8,
}

/// SourceTV spectator details, present when EDF bit `0x40` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTv {
    pub port: u16,
    pub name: String,
}

/// Server information as obtained by [crate::query::ServerQuery::info].
#[derive(Debug, Clone, PartialEq)]
pub struct ServerInfo {
    /// A2S_INFO protocol version
    pub protocol: u8,
    /// Server hostname
    pub name: String,
    /// Current map
    pub map: String,
    /// Location of server files
    pub folder: String,
    /// Name of game
    pub game: String,
    /// Steam app ID of game
    pub app_id: u16,
    /// Current players
    pub players: u8,
    /// Max players
    pub max_players: u8,
    /// Current bots
    pub bots: u8,
    pub server_type: ServerType,
    pub environment: Environment,
    pub visibility: Visibility,
    /// Is the server VAC secured?
    pub vac: bool,
    pub ship: Option<ShipInfo>,
    /// Game version
    pub version: String,
    /// Extra Data Flags; decides which of the fields below are present.
    pub edf: u8,
    /// Game port, if different from the query port
    pub port: Option<u16>,
    /// Server SteamID
    pub steam_id: Option<u64>,
    pub source_tv: Option<SourceTv>,
    /// Tags that describe the game
    pub keywords: Option<String>,
    /// 64-bit game ID; the low 24 bits are the app ID
    pub game_id: Option<u64>,
}

impl ServerInfo {
    const SHIP_APP_ID: u16 = 2400;

    pub const EDF_PORT: u8 = 0x80;
    pub const EDF_STEAM_ID: u8 = 0x10;
    pub const EDF_SOURCE_TV: u8 = 0x40;
    pub const EDF_KEYWORDS: u8 = 0x20;
    pub const EDF_GAME_ID: u8 = 0x01;

    /// Parse the body of an A2S_INFO response (everything after the `I` header).
    pub fn parse(data: &[u8]) -> Result<ServerInfo, SourceQueryError> {
        let mut offset: usize = 0;
        let info: ServerInfo = Self::decode(data, &mut offset)?;
        if offset != data.len() {
            trace!("ignoring {} trailing bytes after A2S_INFO payload", data.len() - offset);
        }
        Ok(info)
    }

    /// Decode starting at `offset`, leaving it at the first byte not consumed.
    pub fn decode(data: &[u8], offset: &mut usize) -> Result<ServerInfo, SourceQueryError> {
        let protocol: u8 = get_u8(data, offset)?;
        let name: String = get_string(data, offset)?;
        let map: String = get_string(data, offset)?;
        let folder: String = get_string(data, offset)?;
        let game: String = get_string(data, offset)?;
        let app_id: u16 = get_u16(data, offset)?;
        let players: u8 = get_u8(data, offset)?;
        let max_players: u8 = get_u8(data, offset)?;
        let bots: u8 = get_u8(data, offset)?;
        let server_type: ServerType = get_u8(data, offset)?.try_into()?;
        let environment: Environment = get_u8(data, offset)?.try_into()?;
        let visibility: Visibility = get_u8(data, offset)?.try_into()?;
        let vac: bool = get_u8(data, offset)? == 1;

        let ship: Option<ShipInfo> = if app_id == Self::SHIP_APP_ID {
            Some(ShipInfo {
                mode: get_u8(data, offset)?,
                witnesses: get_u8(data, offset)?,
                duration: get_u8(data, offset)?,
            })
        } else {
            None
        };

        let version: String = get_string(data, offset)?;

        // older servers end the packet here
        let edf: u8 = if *offset == data.len() {
            0
        } else {
            get_u8(data, offset)?
        };

        let mut info = ServerInfo {
            protocol,
            name,
            map,
            folder,
            game,
            app_id,
            players,
            max_players,
            bots,
            server_type,
            environment,
            visibility,
            vac,
            ship,
            version,
            edf,
            port: None,
            steam_id: None,
            source_tv: None,
            keywords: None,
            game_id: None,
        };
        info.parse_extra_data(data, offset)?;

        Ok(info)
    }

    // order matters here, it is not the order of the bits
    fn parse_extra_data(&mut self, data: &[u8], offset: &mut usize) -> Result<(), SourceQueryError> {
        if self.edf & Self::EDF_PORT != 0 {
            self.port = Some(get_u16(data, offset)?);
        }
        if self.edf & Self::EDF_STEAM_ID != 0 {
            self.steam_id = Some(get_u64(data, offset)?);
        }
        if self.edf & Self::EDF_SOURCE_TV != 0 {
            let port: u16 = get_u16(data, offset)?;
            let name: String = get_string(data, offset)?;
            self.source_tv = Some(SourceTv { port, name });
        }
        if self.edf & Self::EDF_KEYWORDS != 0 {
            self.keywords = Some(get_string(data, offset)?);
        }
        if self.edf & Self::EDF_GAME_ID != 0 {
            self.game_id = Some(get_u64(data, offset)?);
        }
        Ok(())
    }

    /// Is the server password protected?
    pub fn password_protected(&self) -> bool {
        self.visibility == Visibility::Private
    }

    /// Keywords split on commas, as most Source games use them.
    pub fn tags(&self) -> Vec<&str> {
        self.keywords
            .as_deref()
            .map(|k| k.split(',').filter(|t| !t.is_empty()).collect())
            .unwrap_or_default()
    }
}
