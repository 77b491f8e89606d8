use crate::error::SourceQueryError;
use crate::parse::get_array4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketHeader {
    Single,
    Split,
}

/// Convert an i32 into a [PacketHeader].
impl TryFrom<i32> for PacketHeader {
    type Error = SourceQueryError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        match value {
            -1 => Ok(PacketHeader::Single),
            -2 => Ok(PacketHeader::Split),
            n => Err(SourceQueryError::UnknownPacketHeader(n)),
        }
    }
}

/// For packing a [PacketHeader] into a packet in [RequestPacket::pack].
impl PacketHeader {
    pub fn to_le_bytes(self) -> [u8; 4] {
        let value: i32 = match self {
            PacketHeader::Single => -1,
            PacketHeader::Split => -2,
        };
        value.to_le_bytes()
    }
}

/// Message-type bytes used in requests and responses.
///
/// See <https://developer.valvesoftware.com/wiki/Server_queries>.
pub struct PacketType;

impl PacketType {
    /// A2S_INFO request ('T')
    pub const INFO_REQUEST: u8 = 0x54;
    /// A2S_PLAYER request ('U')
    pub const PLAYER_REQUEST: u8 = 0x55;
    /// A2S_RULES request ('V')
    pub const RULES_REQUEST: u8 = 0x56;

    /// S2C_CHALLENGE ('A')
    ///
    /// The server may reply with a challenge to the client. In that case,
    /// the client should repeat the request with the challenge number.
    pub const CHALLENGE: u8 = 0x41;
    /// A2S_INFO response ('I')
    pub const INFO_RESPONSE: u8 = 0x49;
    /// A2S_PLAYER response ('D')
    pub const PLAYER_RESPONSE: u8 = 0x44;
    /// A2S_RULES response ('E')
    pub const RULES_RESPONSE: u8 = 0x45;
}

/// Challenge value that asks the server for a fresh challenge.
pub const NO_CHALLENGE: i32 = -1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestPacket {
    packet_type: u8,
    body: &'static [u8],
    challenge: Option<[u8; 4]>,
}

impl RequestPacket {
    const INFO_BODY: &'static [u8] = b"Source Engine Query\0";

    /// An A2S_INFO request, with the challenge appended when resending.
    pub fn info(challenge: Option<[u8; 4]>) -> Self {
        RequestPacket {
            packet_type: PacketType::INFO_REQUEST,
            body: Self::INFO_BODY,
            challenge,
        }
    }

    /// A challenge-carrying request such as A2S_PLAYER or A2S_RULES.
    ///
    /// Use [NO_CHALLENGE] to request a fresh challenge.
    pub fn generic(packet_type: u8, challenge: i32) -> Self {
        RequestPacket {
            packet_type,
            body: &[],
            challenge: Some(challenge.to_le_bytes()),
        }
    }

    /// Serializes a request packet into an array of bytes.
    pub fn pack(&self) -> Vec<u8> {
        // packet structure: header, type, body (and challenge)
        let mut payload: Vec<u8> = Vec::with_capacity(5 + self.body.len() + 4);
        payload.extend_from_slice(&PacketHeader::Single.to_le_bytes());
        payload.push(self.packet_type);
        payload.extend_from_slice(self.body);
        if let Some(c) = &self.challenge {
            payload.extend_from_slice(c);
        }

        payload
    }

    pub fn packet_type(&self) -> u8 {
        self.packet_type
    }

    pub fn challenge(&self) -> Option<[u8; 4]> {
        self.challenge
    }
}

/// Read the message-type header of a raw response (the byte after the 4-byte marker).
pub fn read_header(incoming: &[u8]) -> Result<u8, SourceQueryError> {
    incoming
        .get(ResponsePacket::TYPE_OFFSET)
        .copied()
        .ok_or(SourceQueryError::MalformedResponse("response too short to contain a header"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponsePacket {
    header: u8,
    body: Vec<u8>,
}

impl ResponsePacket {
    const MARKER_OFFSET: usize = 0;
    const TYPE_OFFSET: usize = 4;
    const BODY_OFFSET: usize = 5;

    /// Deserializes an incoming packet, splitting it up into header and body.
    ///
    /// Only the simple (single packet) form is supported.
    pub fn unpack(incoming: &[u8]) -> Result<Self, SourceQueryError> {
        let header: u8 = read_header(incoming)?;

        let mut offset: usize = Self::MARKER_OFFSET;
        let raw_marker: [u8; 4] = get_array4(incoming, &mut offset)?;
        match PacketHeader::try_from(i32::from_le_bytes(raw_marker))? {
            PacketHeader::Single => Ok(ResponsePacket {
                header,
                body: incoming[Self::BODY_OFFSET..].to_vec(),
            }),
            PacketHeader::Split => Err(SourceQueryError::SplitPacket),
        }
    }

    pub fn header(&self) -> u8 {
        self.header
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn is_challenge(&self) -> bool {
        self.header == PacketType::CHALLENGE
    }

    /// The 4-byte challenge token of an S2C_CHALLENGE response.
    pub fn challenge(&self) -> Result<[u8; 4], SourceQueryError> {
        get_array4(&self.body, &mut 0)
            .map_err(|_| SourceQueryError::MalformedResponse("challenge response too short"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn info_request_without_challenge() {
        let request: RequestPacket = RequestPacket::info(None);
        assert_eq!(request.packet_type(), PacketType::INFO_REQUEST);
        assert_eq!(request.challenge(), None);
        let packed: Vec<u8> = request.pack();
        let mut expected: Vec<u8> = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x54];
        expected.extend_from_slice(b"Source Engine Query\0");
        assert_eq!(packed, expected);
    }

    #[test]
    fn info_request_with_challenge() {
        let packed: Vec<u8> = RequestPacket::info(Some([0x0A, 0x08, 0x5E, 0xEA])).pack();
        assert_eq!(packed.len(), 5 + 20 + 4);
        assert_eq!(&packed[25..], &[0x0A, 0x08, 0x5E, 0xEA]);
    }

    #[test]
    fn generic_request_encodes_sentinel() {
        let packed: Vec<u8> = RequestPacket::generic(PacketType::PLAYER_REQUEST, NO_CHALLENGE).pack();
        assert_eq!(packed, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x55, 0xFF, 0xFF, 0xFF, 0xFF]);
    }

    #[test]
    fn challenge_round_trip() {
        let request: RequestPacket = RequestPacket::generic(PacketType::PLAYER_REQUEST, 0x12349A22);
        assert_eq!(request.packet_type(), PacketType::PLAYER_REQUEST);
        assert_eq!(request.challenge(), Some([0x22, 0x9A, 0x34, 0x12]));
        let packed: Vec<u8> = request.pack();
        assert_eq!(&packed[5..], &[0x22, 0x9A, 0x34, 0x12]);

        let mut reply: Vec<u8> = vec![0xFF, 0xFF, 0xFF, 0xFF, PacketType::CHALLENGE];
        reply.extend_from_slice(&packed[5..]);
        let response: ResponsePacket = ResponsePacket::unpack(&reply).unwrap();
        assert!(response.is_challenge());
        assert_eq!(i32::from_le_bytes(response.challenge().unwrap()), 0x12349A22);
    }

    #[test]
    fn header_classification() {
        assert_eq!(read_header(&[0xFF, 0xFF, 0xFF, 0xFF, 0x41, 1, 2, 3, 4]).unwrap(), PacketType::CHALLENGE);
        assert_eq!(read_header(&[0xFF, 0xFF, 0xFF, 0xFF, 0x49]).unwrap(), PacketType::INFO_RESPONSE);
        assert!(matches!(
            read_header(&[0xFF, 0xFF, 0xFF, 0xFF]),
            Err(SourceQueryError::MalformedResponse(_))
        ));
    }

    #[test]
    fn split_packets_are_rejected() {
        let err = ResponsePacket::unpack(&[0xFE, 0xFF, 0xFF, 0xFF, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, SourceQueryError::SplitPacket));
    }

    #[test]
    fn unknown_marker_is_rejected() {
        let err = ResponsePacket::unpack(&[0x00, 0x00, 0x00, 0x00, 0x49]).unwrap_err();
        assert!(matches!(err, SourceQueryError::UnknownPacketHeader(0)));
    }

    #[test]
    fn short_challenge_is_malformed() {
        let response: ResponsePacket = ResponsePacket::unpack(&[0xFF, 0xFF, 0xFF, 0xFF, 0x41, 0x01]).unwrap();
        assert!(matches!(response.challenge(), Err(SourceQueryError::MalformedResponse(_))));
    }
}
