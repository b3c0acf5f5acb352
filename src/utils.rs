use once_cell::sync::OnceCell;
use ring::hmac;
use ring::rand::SecureRandom;
use uuid::Uuid;

macro_rules! regex {
    ($pattern: expr) => {{
        use once_cell::sync::OnceCell;
        use regex::Regex;
        static CELL: OnceCell<Regex> = OnceCell::new();
        CELL.get_or_init(|| Regex::new($pattern).unwrap())
    }};
}

pub fn id() -> Uuid {
    use std::time::SystemTime;
    use uuid::v1::Context as UuidContext;
    use uuid::v1::Timestamp;

    static NODE_ID: OnceCell<[u8; 6]> = OnceCell::new();
    let node_id = NODE_ID.get_or_init(|| {
        let rng = ring::rand::SystemRandom::new();
        let mut id = [0u8; 6];
        rng.fill(&mut id).unwrap();
        id
    });
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("SystemTime before UNIX EPOCH!");
    static CONTEXT: UuidContext = UuidContext::new(0);
    let timestamp = Timestamp::from_unix(&CONTEXT, now.as_secs(), now.subsec_nanos());
    Uuid::new_v1(timestamp, node_id).expect("failed to generate UUID")
}

/// Epoch milliseconds.
pub fn timestamp() -> i64 {
    use std::time::SystemTime;
    let now = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .expect("SystemTime before UNIX EPOCH!");
    now.as_millis() as i64
}

pub fn sha1(data: &[u8]) -> ring::digest::Digest {
    ring::digest::digest(&ring::digest::SHA1_FOR_LEGACY_USE_ONLY, data)
}

fn key() -> &'static hmac::Key {
    use crate::context::secret;
    use ring::digest;
    static KEY: OnceCell<hmac::Key> = OnceCell::new();
    KEY.get_or_init(|| {
        let digest = digest::digest(&digest::SHA256, secret().as_bytes());
        hmac::Key::new(hmac::HMAC_SHA256, digest.as_ref())
    })
}

pub fn sign(message: &str) -> String {
    let signed = hmac::sign(key(), message.as_bytes());
    base64::encode(&signed)
}

pub fn verify(message: &str, sign: &str) -> Option<()> {
    let sign = base64::decode(sign).ok()?;
    hmac::verify(key(), message.as_bytes(), &sign).ok()
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_sign() {
        std::env::set_var("SECRET", "just a test secret");
        let message = "hello, world";
        let signed = super::sign(message);
        super::verify(message, &signed).unwrap();
        assert!(super::verify("hello, world!", &signed).is_none());
    }

    #[test]
    fn test_id() {
        let a = super::id();
        let b = super::id();
        assert_ne!(a, b);
    }
}
