use crate::wire::{self, Request, Response};
use crate::{KeyTableService, LinkError};
use std::io;
use std::net::{TcpListener, TcpStream};

/// Serve the key-table protocol on `listener`, dispatching into `service`.
///
/// Connections are handled one at a time to completion; the service is
/// single-tenant and every call holds the epoch exclusively anyway, so
/// there is nothing to gain from interleaving.
pub fn serve<S: KeyTableService>(listener: TcpListener, service: &S) -> io::Result<()> {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                log::warn!("accept failed: {e}");
                continue;
            }
        };

        match stream.peer_addr() {
            Ok(peer) => log::info!("serving {peer}"),
            Err(_) => log::info!("serving new connection"),
        }

        match serve_connection(stream, service) {
            Ok(()) => log::info!("connection closed"),
            Err(e) => log::warn!("connection aborted: {e}"),
        }
    }

    Ok(())
}

fn serve_connection<S: KeyTableService>(mut stream: TcpStream, service: &S) -> io::Result<()> {
    loop {
        let payload = match wire::read_frame(&mut stream) {
            Ok(p) => p,
            // client hung up between requests
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(e) => return Err(e),
        };

        let req = wire::decode_request(payload.as_slice())?;
        let resp = match dispatch(service, &req) {
            Ok(resp) => resp,
            Err(LinkError::Service(e)) => Response::Failure(e),
            Err(LinkError::Transport(e)) => return Err(e),
        };

        wire::write_frame(&mut stream, wire::encode_response(&resp).as_slice())?;
    }
}

fn dispatch<S: KeyTableService>(service: &S, req: &Request) -> Result<Response, LinkError> {
    match req {
        Request::Parameters => service.parameters().map(|p| Response::Parameters {
            rsa_bits: p.rsa_bits as u32,
            hash_bits: p.hash_bits as u32,
            max_queries: p.max_queries as u32,
        }),
        Request::IsInitialized => service.is_initialized().map(Response::Bool),
        Request::SetRsaBits(v) => service.set_rsa_bits(*v as usize).map(|()| Response::Unit),
        Request::SetHashBits(v) => service.set_hash_bits(*v as usize).map(|()| Response::Unit),
        Request::SetMaxQueries(v) => service
            .set_max_queries(*v as usize)
            .map(|()| Response::Unit),
        Request::GenerateNewKey => service.generate_new_key().map(|()| Response::Unit),
        Request::DeleteKeys => service.delete_keys().map(|()| Response::Unit),
        Request::ModulusN => service.modulus_n().map(Response::Uint),
        Request::PrivateKeyTableRows(h) => {
            service.private_key_table_rows(h).map(Response::UintSeq)
        }
        Request::PublicKeyTable => service.public_key_table().map(Response::UintSeq),
    }
}
