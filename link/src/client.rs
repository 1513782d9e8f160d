use crate::wire::{self, Request, Response};
use crate::{KeyTableService, LinkError, Parameters};
use num_bigint::BigUint;
use std::io;
use std::net::{TcpStream, ToSocketAddrs};
use std::sync::Mutex;

/// Blocking TCP client for a remote key-table service. One request/response
/// exchange per call; exchanges are serialized on the single stream.
pub struct TcpLink {
    stream: Mutex<TcpStream>,
}

impl TcpLink {
    pub fn connect<A: ToSocketAddrs>(addr: A) -> Result<Self, LinkError> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(Self {
            stream: Mutex::new(stream),
        })
    }

    fn exchange(&self, req: &Request) -> Result<Response, LinkError> {
        let mut stream = self.stream.lock().unwrap_or_else(|e| e.into_inner());
        wire::write_frame(&mut *stream, wire::encode_request(req).as_slice())?;
        let payload = wire::read_frame(&mut *stream)?;
        match wire::decode_response(payload.as_slice())? {
            Response::Failure(e) => Err(LinkError::Service(e)),
            resp => Ok(resp),
        }
    }
}

fn unexpected(resp: &Response) -> LinkError {
    LinkError::Transport(io::Error::new(
        io::ErrorKind::InvalidData,
        format!("response {resp:?} does not answer the request"),
    ))
}

fn to_wire_u32(v: usize) -> Result<u32, LinkError> {
    u32::try_from(v).map_err(|_| {
        LinkError::Transport(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("parameter `{v}` exceeds the wire width"),
        ))
    })
}

impl KeyTableService for TcpLink {
    fn parameters(&self) -> Result<Parameters, LinkError> {
        match self.exchange(&Request::Parameters)? {
            Response::Parameters {
                rsa_bits,
                hash_bits,
                max_queries,
            } => Ok(Parameters {
                rsa_bits: rsa_bits as usize,
                hash_bits: hash_bits as usize,
                max_queries: max_queries as usize,
            }),
            resp => Err(unexpected(&resp)),
        }
    }

    fn is_initialized(&self) -> Result<bool, LinkError> {
        match self.exchange(&Request::IsInitialized)? {
            Response::Bool(v) => Ok(v),
            resp => Err(unexpected(&resp)),
        }
    }

    fn set_rsa_bits(&self, bits: usize) -> Result<(), LinkError> {
        match self.exchange(&Request::SetRsaBits(to_wire_u32(bits)?))? {
            Response::Unit => Ok(()),
            resp => Err(unexpected(&resp)),
        }
    }

    fn set_hash_bits(&self, bits: usize) -> Result<(), LinkError> {
        match self.exchange(&Request::SetHashBits(to_wire_u32(bits)?))? {
            Response::Unit => Ok(()),
            resp => Err(unexpected(&resp)),
        }
    }

    fn set_max_queries(&self, max_queries: usize) -> Result<(), LinkError> {
        match self.exchange(&Request::SetMaxQueries(to_wire_u32(max_queries)?))? {
            Response::Unit => Ok(()),
            resp => Err(unexpected(&resp)),
        }
    }

    fn generate_new_key(&self) -> Result<(), LinkError> {
        match self.exchange(&Request::GenerateNewKey)? {
            Response::Unit => Ok(()),
            resp => Err(unexpected(&resp)),
        }
    }

    fn delete_keys(&self) -> Result<(), LinkError> {
        match self.exchange(&Request::DeleteKeys)? {
            Response::Unit => Ok(()),
            resp => Err(unexpected(&resp)),
        }
    }

    fn modulus_n(&self) -> Result<BigUint, LinkError> {
        match self.exchange(&Request::ModulusN)? {
            Response::Uint(n) => Ok(n),
            resp => Err(unexpected(&resp)),
        }
    }

    fn private_key_table_rows(&self, message_hash: &BigUint) -> Result<Vec<BigUint>, LinkError> {
        match self.exchange(&Request::PrivateKeyTableRows(message_hash.clone()))? {
            Response::UintSeq(rows) => Ok(rows),
            resp => Err(unexpected(&resp)),
        }
    }

    fn public_key_table(&self) -> Result<Vec<BigUint>, LinkError> {
        match self.exchange(&Request::PublicKeyTable)? {
            Response::UintSeq(table) => Ok(table),
            resp => Err(unexpected(&resp)),
        }
    }
}
