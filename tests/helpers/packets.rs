use a2squery::packet::PacketType;

pub fn reply(header: u8, body: &[u8]) -> Vec<u8> {
    let mut data = vec![0xFF, 0xFF, 0xFF, 0xFF, header];
    data.extend_from_slice(body);
    data
}

pub fn challenge_reply(token: i32) -> Vec<u8> {
    reply(PacketType::CHALLENGE, &token.to_le_bytes())
}

pub fn info_request(challenge: Option<i32>) -> Vec<u8> {
    let mut data = vec![0xFF, 0xFF, 0xFF, 0xFF, 0x54];
    data.extend_from_slice(b"Source Engine Query\0");
    if let Some(c) = challenge {
        data.extend_from_slice(&c.to_le_bytes());
    }
    data
}

pub fn generic_request(opcode: u8, challenge: i32) -> Vec<u8> {
    let mut data = vec![0xFF, 0xFF, 0xFF, 0xFF, opcode];
    data.extend_from_slice(&challenge.to_le_bytes());
    data
}

/// A2S_INFO body of a Counter-Strike 2 style server with keywords.
pub fn info_body() -> Vec<u8> {
    let mut data = vec![17];
    data.extend_from_slice(b"Test Server\0");
    data.extend_from_slice(b"de_inferno\0");
    data.extend_from_slice(b"csgo\0");
    data.extend_from_slice(b"Counter-Strike 2\0");
    data.extend_from_slice(&730u16.to_le_bytes());
    data.extend_from_slice(&[3, 10, 1, b'd', b'w', 1, 1]);
    data.extend_from_slice(b"1.40.1.1\0");
    data.push(0x80 | 0x20);
    data.extend_from_slice(&27016u16.to_le_bytes());
    data.extend_from_slice(b"secure,competitive\0");
    data
}

pub fn players_body(players: &[(&str, i32, f32)]) -> Vec<u8> {
    let mut data = vec![players.len() as u8];
    for (index, (name, score, duration)) in players.iter().enumerate() {
        data.push(index as u8);
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(&score.to_le_bytes());
        data.extend_from_slice(&duration.to_le_bytes());
    }
    data
}

pub fn rules_body(rules: &[(&str, &str)]) -> Vec<u8> {
    let mut data = (rules.len() as u16).to_le_bytes().to_vec();
    for (name, value) in rules {
        data.extend_from_slice(name.as_bytes());
        data.push(0);
        data.extend_from_slice(value.as_bytes());
        data.push(0);
    }
    data
}
