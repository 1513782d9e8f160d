//! Frame and payload codec.
//!
//! A frame is a `u32` big-endian payload length followed by the payload.
//! A payload is one opcode byte followed by the operation's body. Large
//! integers travel as sign-and-magnitude: one sign byte (only `0x00`,
//! non-negative, is ever produced), a `u32` big-endian magnitude length,
//! and the magnitude bytes, most significant first.

use crate::ServiceError;
use num_bigint::BigUint;
use std::io::{self, Read, Write};

/// Upper bound on a single payload. A full public table at large widths is
/// `hash_bits * modulus_bytes`, far below this.
const MAX_FRAME: usize = 1 << 24;

const SIGN_NON_NEGATIVE: u8 = 0x00;

const OP_PARAMETERS: u8 = 0x01;
const OP_IS_INITIALIZED: u8 = 0x02;
const OP_SET_RSA_BITS: u8 = 0x03;
const OP_SET_HASH_BITS: u8 = 0x04;
const OP_SET_MAX_QUERIES: u8 = 0x05;
const OP_GENERATE_NEW_KEY: u8 = 0x06;
const OP_DELETE_KEYS: u8 = 0x07;
const OP_MODULUS_N: u8 = 0x08;
const OP_PRIVATE_KEY_TABLE_ROWS: u8 = 0x09;
const OP_PUBLIC_KEY_TABLE: u8 = 0x0a;

const RESP_UNIT: u8 = 0x80;
const RESP_BOOL: u8 = 0x81;
const RESP_PARAMETERS: u8 = 0x82;
const RESP_UINT: u8 = 0x83;
const RESP_UINT_SEQ: u8 = 0x84;
const RESP_FAILURE: u8 = 0xff;

const ERR_UNINITIALIZED: u8 = 0x01;
const ERR_INVALID_QUERY: u8 = 0x02;
const ERR_EXHAUSTED: u8 = 0x03;
const ERR_GENERATION: u8 = 0x04;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Request {
    Parameters,
    IsInitialized,
    SetRsaBits(u32),
    SetHashBits(u32),
    SetMaxQueries(u32),
    GenerateNewKey,
    DeleteKeys,
    ModulusN,
    PrivateKeyTableRows(BigUint),
    PublicKeyTable,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Response {
    Unit,
    Bool(bool),
    Parameters {
        rsa_bits: u32,
        hash_bits: u32,
        max_queries: u32,
    },
    Uint(BigUint),
    UintSeq(Vec<BigUint>),
    Failure(ServiceError),
}

pub(crate) fn write_frame<W: Write>(w: &mut W, payload: &[u8]) -> io::Result<()> {
    let len = u32::try_from(payload.len())
        .map_err(|_| malformed("payload exceeds the frame length prefix"))?;
    w.write_all(&len.to_be_bytes())?;
    w.write_all(payload)?;
    w.flush()
}

pub(crate) fn read_frame<R: Read>(r: &mut R) -> io::Result<Vec<u8>> {
    let mut len = [0u8; 4];
    r.read_exact(&mut len)?;
    let len = u32::from_be_bytes(len) as usize;
    if len > MAX_FRAME {
        return Err(malformed(format!("frame of {len} bytes exceeds the limit")));
    }

    let mut payload = vec![0u8; len];
    r.read_exact(payload.as_mut_slice())?;
    Ok(payload)
}

pub(crate) fn encode_request(req: &Request) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    match req {
        Request::Parameters => buf.push(OP_PARAMETERS),
        Request::IsInitialized => buf.push(OP_IS_INITIALIZED),
        Request::SetRsaBits(v) => {
            buf.push(OP_SET_RSA_BITS);
            put_u32(&mut buf, *v);
        }
        Request::SetHashBits(v) => {
            buf.push(OP_SET_HASH_BITS);
            put_u32(&mut buf, *v);
        }
        Request::SetMaxQueries(v) => {
            buf.push(OP_SET_MAX_QUERIES);
            put_u32(&mut buf, *v);
        }
        Request::GenerateNewKey => buf.push(OP_GENERATE_NEW_KEY),
        Request::DeleteKeys => buf.push(OP_DELETE_KEYS),
        Request::ModulusN => buf.push(OP_MODULUS_N),
        Request::PrivateKeyTableRows(h) => {
            buf.push(OP_PRIVATE_KEY_TABLE_ROWS);
            put_uint(&mut buf, h);
        }
        Request::PublicKeyTable => buf.push(OP_PUBLIC_KEY_TABLE),
    }
    buf
}

pub(crate) fn decode_request(payload: &[u8]) -> io::Result<Request> {
    let mut cur = payload;
    let op = take(&mut cur, 1)?[0];
    let req = match op {
        OP_PARAMETERS => Request::Parameters,
        OP_IS_INITIALIZED => Request::IsInitialized,
        OP_SET_RSA_BITS => Request::SetRsaBits(get_u32(&mut cur)?),
        OP_SET_HASH_BITS => Request::SetHashBits(get_u32(&mut cur)?),
        OP_SET_MAX_QUERIES => Request::SetMaxQueries(get_u32(&mut cur)?),
        OP_GENERATE_NEW_KEY => Request::GenerateNewKey,
        OP_DELETE_KEYS => Request::DeleteKeys,
        OP_MODULUS_N => Request::ModulusN,
        OP_PRIVATE_KEY_TABLE_ROWS => Request::PrivateKeyTableRows(get_uint(&mut cur)?),
        OP_PUBLIC_KEY_TABLE => Request::PublicKeyTable,
        op => return Err(malformed(format!("unknown request opcode {op:#04x}"))),
    };
    expect_drained(cur)?;
    Ok(req)
}

pub(crate) fn encode_response(resp: &Response) -> Vec<u8> {
    let mut buf = Vec::with_capacity(64);
    match resp {
        Response::Unit => buf.push(RESP_UNIT),
        Response::Bool(v) => {
            buf.push(RESP_BOOL);
            buf.push(u8::from(*v));
        }
        Response::Parameters {
            rsa_bits,
            hash_bits,
            max_queries,
        } => {
            buf.push(RESP_PARAMETERS);
            put_u32(&mut buf, *rsa_bits);
            put_u32(&mut buf, *hash_bits);
            put_u32(&mut buf, *max_queries);
        }
        Response::Uint(v) => {
            buf.push(RESP_UINT);
            put_uint(&mut buf, v);
        }
        Response::UintSeq(vs) => {
            buf.push(RESP_UINT_SEQ);
            put_u32(&mut buf, vs.len() as u32);
            for v in vs.iter() {
                put_uint(&mut buf, v);
            }
        }
        Response::Failure(e) => {
            buf.push(RESP_FAILURE);
            match e {
                ServiceError::Uninitialized => buf.push(ERR_UNINITIALIZED),
                ServiceError::InvalidQuery(msg) => {
                    buf.push(ERR_INVALID_QUERY);
                    put_str(&mut buf, msg);
                }
                ServiceError::Exhausted => buf.push(ERR_EXHAUSTED),
                ServiceError::Generation(msg) => {
                    buf.push(ERR_GENERATION);
                    put_str(&mut buf, msg);
                }
            }
        }
    }
    buf
}

pub(crate) fn decode_response(payload: &[u8]) -> io::Result<Response> {
    let mut cur = payload;
    let op = take(&mut cur, 1)?[0];
    let resp = match op {
        RESP_UNIT => Response::Unit,
        RESP_BOOL => Response::Bool(take(&mut cur, 1)?[0] != 0),
        RESP_PARAMETERS => Response::Parameters {
            rsa_bits: get_u32(&mut cur)?,
            hash_bits: get_u32(&mut cur)?,
            max_queries: get_u32(&mut cur)?,
        },
        RESP_UINT => Response::Uint(get_uint(&mut cur)?),
        RESP_UINT_SEQ => {
            let count = get_u32(&mut cur)? as usize;
            let mut vs = Vec::with_capacity(count.min(1 << 16));
            for _ in 0..count {
                vs.push(get_uint(&mut cur)?);
            }
            Response::UintSeq(vs)
        }
        RESP_FAILURE => {
            let code = take(&mut cur, 1)?[0];
            let e = match code {
                ERR_UNINITIALIZED => ServiceError::Uninitialized,
                ERR_INVALID_QUERY => ServiceError::InvalidQuery(get_str(&mut cur)?),
                ERR_EXHAUSTED => ServiceError::Exhausted,
                ERR_GENERATION => ServiceError::Generation(get_str(&mut cur)?),
                code => return Err(malformed(format!("unknown failure code {code:#04x}"))),
            };
            Response::Failure(e)
        }
        op => return Err(malformed(format!("unknown response opcode {op:#04x}"))),
    };
    expect_drained(cur)?;
    Ok(resp)
}

fn put_u32(buf: &mut Vec<u8>, v: u32) {
    buf.extend_from_slice(&v.to_be_bytes());
}

fn get_u32(cur: &mut &[u8]) -> io::Result<u32> {
    let bytes = take(cur, 4)?;
    Ok(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

fn put_uint(buf: &mut Vec<u8>, v: &BigUint) {
    buf.push(SIGN_NON_NEGATIVE);
    let mag = v.to_bytes_be();
    put_u32(buf, mag.len() as u32);
    buf.extend_from_slice(mag.as_slice());
}

fn get_uint(cur: &mut &[u8]) -> io::Result<BigUint> {
    let sign = take(cur, 1)?[0];
    if sign != SIGN_NON_NEGATIVE {
        return Err(malformed(format!("unsupported sign byte {sign:#04x}")));
    }
    let len = get_u32(cur)? as usize;
    Ok(BigUint::from_bytes_be(take(cur, len)?))
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_u32(buf, s.len() as u32);
    buf.extend_from_slice(s.as_bytes());
}

fn get_str(cur: &mut &[u8]) -> io::Result<String> {
    let len = get_u32(cur)? as usize;
    let bytes = take(cur, len)?;
    String::from_utf8(bytes.to_vec()).map_err(|_| malformed("string body is not utf-8"))
}

fn take<'a>(cur: &mut &'a [u8], n: usize) -> io::Result<&'a [u8]> {
    if cur.len() < n {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "payload ended mid-field",
        ));
    }
    let (head, tail) = cur.split_at(n);
    *cur = tail;
    Ok(head)
}

fn expect_drained(cur: &[u8]) -> io::Result<()> {
    if cur.is_empty() {
        Ok(())
    } else {
        Err(malformed(format!("{} trailing bytes after payload", cur.len())))
    }
}

fn malformed<E>(e: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::InvalidData, e)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_request(req: Request) {
        let decoded = decode_request(&encode_request(&req)).unwrap();
        assert_eq!(req, decoded);
    }

    fn roundtrip_response(resp: Response) {
        let decoded = decode_response(&encode_response(&resp)).unwrap();
        assert_eq!(resp, decoded);
    }

    #[test]
    fn request_codec() {
        roundtrip_request(Request::Parameters);
        roundtrip_request(Request::SetRsaBits(2048));
        roundtrip_request(Request::PrivateKeyTableRows(BigUint::from(5u32)));
        roundtrip_request(Request::PrivateKeyTableRows(
            BigUint::parse_bytes(b"ebaf5ccd6f37291d34bade1bbff539e7", 16).unwrap(),
        ));
    }

    #[test]
    fn response_codec() {
        roundtrip_response(Response::Unit);
        roundtrip_response(Response::Bool(true));
        roundtrip_response(Response::Bool(false));
        roundtrip_response(Response::Parameters {
            rsa_bits: 2048,
            hash_bits: 256,
            max_queries: 16,
        });
        roundtrip_response(Response::Uint(BigUint::from(0u32)));
        roundtrip_response(Response::Uint(BigUint::from(323u32)));
        roundtrip_response(Response::UintSeq(
            [83u32, 251, 145, 131, 49, 121, 227]
                .into_iter()
                .map(BigUint::from)
                .collect(),
        ));
        roundtrip_response(Response::Failure(ServiceError::Uninitialized));
        roundtrip_response(Response::Failure(ServiceError::InvalidQuery(
            "hash has no set bits".to_string(),
        )));
        roundtrip_response(Response::Failure(ServiceError::Exhausted));
        roundtrip_response(Response::Failure(ServiceError::Generation(
            "no suitable prime pair".to_string(),
        )));
    }

    #[test]
    fn uint_wire_shape() {
        // sign byte, u32 magnitude length, big-endian magnitude
        let mut buf = Vec::new();
        put_uint(&mut buf, &BigUint::from(0x0143u32));
        assert_eq!(buf, [0x00, 0, 0, 0, 2, 0x01, 0x43]);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode_request(&[]).is_err());
        assert!(decode_request(&[0x77]).is_err());
        assert!(decode_response(&[RESP_UINT, 0x01, 0, 0, 0, 1, 0xaa]).is_err());
        // trailing junk after a well-formed payload
        assert!(decode_request(&[OP_PARAMETERS, 0x00]).is_err());
    }

    #[test]
    fn frame_roundtrip() {
        let mut buf = Vec::new();
        write_frame(&mut buf, &[1, 2, 3]).unwrap();
        assert_eq!(buf, [0, 0, 0, 3, 1, 2, 3]);
        let payload = read_frame(&mut buf.as_slice()).unwrap();
        assert_eq!(payload, [1, 2, 3]);
    }
}
