use base64ct::{Base64, Encoding};

/// Standard (padded) base64 encode, the alphabet stored records use.
pub fn base64_encode(data: &[u8]) -> String {
    Base64::encode_string(data)
}

/// Standard (padded) base64 decode.
pub fn base64_decode(s: &str) -> Result<Vec<u8>, base64ct::Error> {
    Base64::decode_vec(s)
}
