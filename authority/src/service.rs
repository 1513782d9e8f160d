use crate::KeyEpoch;
use link::{KeyTableService, LinkError, Parameters, ServiceError};
use num_bigint::BigUint;
use std::sync::{Mutex, MutexGuard};
use utils::DefaultRand;

/// Owns at most one key epoch and answers queries against it.
///
/// All state sits behind a single mutex: generation, query serving and
/// deletion are mutually exclusive, so a caller can never observe a half
/// replaced table or move the counter of an epoch that is being torn down.
pub struct Authority {
    state: Mutex<State>,
}

struct State {
    rsa_bits: usize,
    hash_bits: usize,
    max_queries: usize,
    epoch: Option<KeyEpoch>,
}

impl Authority {
    pub fn new(rsa_bits: usize, hash_bits: usize, max_queries: usize) -> Self {
        Self {
            state: Mutex::new(State {
                rsa_bits,
                hash_bits,
                max_queries,
                epoch: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Install the fixed insecure demo key in place of whatever epoch is
    /// live, adopting its widths; the query bound stays as configured.
    pub fn install_debug_key(&self) {
        let mut st = self.lock();
        st.rsa_bits = 9;
        st.hash_bits = 7;
        st.epoch = Some(KeyEpoch::debug_fixture(st.max_queries));
    }

    /// Number of private-table queries answered against the live epoch.
    pub fn queries_used(&self) -> Option<usize> {
        self.lock().epoch.as_ref().map(|e| e.gate().used())
    }
}

impl KeyTableService for Authority {
    fn parameters(&self) -> Result<Parameters, LinkError> {
        let st = self.lock();
        Ok(Parameters {
            rsa_bits: st.rsa_bits,
            hash_bits: st.hash_bits,
            max_queries: st.max_queries,
        })
    }

    fn is_initialized(&self) -> Result<bool, LinkError> {
        let st = self.lock();
        Ok(st.epoch.as_ref().is_some_and(|e| e.hash_bits() > 0))
    }

    fn set_rsa_bits(&self, bits: usize) -> Result<(), LinkError> {
        self.lock().rsa_bits = bits;
        Ok(())
    }

    fn set_hash_bits(&self, bits: usize) -> Result<(), LinkError> {
        self.lock().hash_bits = bits;
        Ok(())
    }

    fn set_max_queries(&self, max_queries: usize) -> Result<(), LinkError> {
        self.lock().max_queries = max_queries;
        Ok(())
    }

    /// Replaces the live epoch wholesale; the old one is dropped (and its
    /// tables cleared) only after the new one exists.
    fn generate_new_key(&self) -> Result<(), LinkError> {
        let mut st = self.lock();
        let mut rng = DefaultRand::default();
        let epoch = KeyEpoch::generate(st.rsa_bits, st.hash_bits, st.max_queries, &mut rng)
            .map_err(LinkError::Service)?;
        log::info!("{}-bit RSA keypair generated", st.rsa_bits);
        st.epoch = Some(epoch);
        Ok(())
    }

    fn delete_keys(&self) -> Result<(), LinkError> {
        let mut st = self.lock();
        if st.epoch.take().is_some() {
            log::info!("deleting keys");
        }
        Ok(())
    }

    fn modulus_n(&self) -> Result<BigUint, LinkError> {
        let st = self.lock();
        match st.epoch.as_ref() {
            Some(epoch) => Ok(epoch.modulus().clone()),
            None => Err(ServiceError::Uninitialized.into()),
        }
    }

    fn private_key_table_rows(&self, message_hash: &BigUint) -> Result<Vec<BigUint>, LinkError> {
        let mut st = self.lock();

        let spent = {
            let Some(epoch) = st.epoch.as_ref() else {
                return Err(ServiceError::Uninitialized.into());
            };

            let rows = epoch.hash_bits();
            let set_bits = message_hash.count_ones() as usize;
            let width = message_hash.bits() as usize;

            if set_bits == 0 {
                return Err(ServiceError::InvalidQuery("hash has no set bits".to_string()).into());
            }
            // The saturated hash (every row requested) is rejected along
            // with genuinely oversized ones.
            if set_bits >= rows {
                return Err(ServiceError::InvalidQuery(format!(
                    "hash selects {set_bits} of {rows} table rows"
                ))
                .into());
            }
            if width > rows {
                return Err(ServiceError::InvalidQuery(format!(
                    "hash width {width} exceeds the table length {rows}"
                ))
                .into());
            }

            epoch.gate().spent()
        };

        if spent {
            log::warn!("max number of queries reached, purging the key epoch");
            st.epoch = None;
            return Err(ServiceError::Exhausted.into());
        }

        let epoch = st.epoch.as_mut().expect("epoch checked above");
        let rows = epoch.private_rows(message_hash);
        epoch.gate_mut().consume();
        Ok(rows)
    }

    fn public_key_table(&self) -> Result<Vec<BigUint>, LinkError> {
        let st = self.lock();
        match st.epoch.as_ref() {
            Some(epoch) if !epoch.public_table().is_empty() => Ok(epoch.public_table().to_vec()),
            _ => Err(ServiceError::Uninitialized.into()),
        }
    }
}
