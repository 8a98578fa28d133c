//! Server engine: key exchange, ratchet, and teardown.
//!
//! [`OatServer`] owns no per-client state. Every call opens the client's
//! sealed record from the [`KeyStore`], does its work, and commits at most
//! one ratchet update through compare-and-swap.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use oat_crypto::{
    ApiKey, BoxKeyPair, SharedKey, Vault, VerifyingKey, derive_client_id, issue_api_key,
    next_api_key, session_mac, verify_session_mac, verifying_key_from_bytes, wrap_api_key,
};
use oat_proto::{
    ClientId, EncryptedApiKey, Footer, Header, InitRequest, InitResponseHeader,
    RollResponseHeader, SessionFields, Token,
};
use tracing::{debug, info, warn};

use crate::{
    auth::{self, ClientAuthResult, Generation, VerifiedRequest},
    config::ServerConfig,
    env::Environment,
    error::{AuthError, OatError},
    storage::{KeyRecord, KeyStore, SealedRatchet},
};

/// A token the server just issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issued {
    /// Client the token belongs to
    pub client_id: ClientId,
    /// Wire token
    pub token: String,
}

/// Result of a successful roll.
#[derive(Debug, Clone)]
pub struct RollOutcome {
    /// Authenticated client
    pub client_id: ClientId,
    /// Roll response carrying the next api key
    pub token: String,
    /// `false` when the client presented the previous generation. The
    /// caller must not re-apply side effects of the request the client
    /// never saw a response for.
    pub valid: bool,
    /// Verified fields from the request
    pub fields: SessionFields,
}

/// An encrypted deinit challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedChallenge {
    /// Client the challenge is for
    pub client_id: ClientId,
    /// `base64(nonce ‖ ciphertext ‖ tag)` under the shared key
    pub encrypted: String,
}

/// Opened key material for one client, valid for one call.
struct OpenRecord {
    shared_key: SharedKey,
    verifying_key: VerifyingKey,
    current: ApiKey,
    previous: ApiKey,
}

/// Server side of the OAT protocol.
///
/// Generic over the randomness source and the key store so the same engine
/// runs against a seeded simulation and a durable database.
#[derive(Clone)]
pub struct OatServer<E, S>
where
    E: Environment,
    S: KeyStore,
{
    env: E,
    store: S,
    vault: Vault,
    config: ServerConfig,
}

impl<E, S> OatServer<E, S>
where
    E: Environment,
    S: KeyStore,
{
    /// Create a server engine.
    pub fn new(env: E, store: S, vault: Vault, config: ServerConfig) -> Self {
        Self { env, store, vault, config }
    }

    /// Domain roll requests must be signed for.
    pub fn domain(&self) -> &str {
        self.config.domain()
    }

    /// Underlying key store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Bootstrap a new client from its init request.
    ///
    /// Generates an ephemeral box keypair, derives the shared key and client
    /// id, mints the first api key (stored as both generations), and returns
    /// an init response token carrying `fields`.
    pub fn init(&self, request: &InitRequest, fields: &SessionFields) -> Result<Issued, OatError> {
        let box_pair = BoxKeyPair::from_seed(self.env.random_array());
        let shared_key = box_pair.diffie_hellman(&request.box_public)?;
        verifying_key_from_bytes(&request.sign_public)?;

        let client_id = ClientId::from_bytes(derive_client_id(&shared_key));
        let api_key = issue_api_key(&self.vault.issuance_key(), &self.env.random_array());

        let record = KeyRecord {
            shared_key: self.seal(shared_key.as_bytes()),
            verifying_key: self.seal(&request.sign_public),
            ratchet: SealedRatchet {
                current: self.seal(api_key.as_bytes()),
                previous: self.seal(api_key.as_bytes()),
            },
        };
        self.store.insert_client(&client_id, &record)?;

        let token =
            self.response_token(client_id, &shared_key, &api_key, fields, Some(box_pair.public_bytes()));

        debug!(client_id = %client_id, "initialized client");
        Ok(Issued { client_id, token })
    }

    /// Authenticate a roll request without advancing the ratchet.
    pub fn authenticate(&self, token: &str) -> Result<ClientAuthResult, OatError> {
        let (_, open, verified) = self.verify(token)?;
        let generation = Self::match_generation(&open, &verified)?;

        Ok(ClientAuthResult { client_id: verified.client_id, generation, fields: verified.fields })
    }

    /// Authenticate a roll request and advance the ratchet.
    ///
    /// A request under the current generation moves
    /// `previous := current; current := next` and reports `valid = true`. A
    /// request under the previous generation replaces only `current` and
    /// reports `valid = false`. Anything older is a [`OatError::TokenMismatch`].
    pub fn roll(&self, token: &str, fields: &SessionFields) -> Result<RollOutcome, OatError> {
        let (record, open, verified) = self.verify(token)?;
        let client_id = verified.client_id;
        let generation = Self::match_generation(&open, &verified)?;

        let (base, previous) = match generation {
            Generation::Current => (&open.current, record.ratchet.current.clone()),
            Generation::Previous => (&open.previous, record.ratchet.previous.clone()),
        };
        let next = next_api_key(base, &self.env.random_array());

        let ratchet = SealedRatchet { current: self.seal(next.as_bytes()), previous };
        self.store.swap_ratchet(&client_id, &record.ratchet, &ratchet)?;

        let valid = generation == Generation::Current;
        if valid {
            debug!(client_id = %client_id, "rolled api key");
        } else {
            warn!(client_id = %client_id, "resynchronized client one generation behind");
        }

        let token = self.response_token(client_id, &open.shared_key, &next, fields, None);
        Ok(RollOutcome { client_id, token, valid, fields: verified.fields })
    }

    /// Re-issue a response token with new session fields.
    ///
    /// `token` must be the latest response issued to the client: its footer
    /// HMAC is checked against the current generation before the header is
    /// reused under a fresh footer.
    pub fn set_session_data(&self, token: &str, fields: &SessionFields) -> Result<String, OatError> {
        let decoded = Token::decode_response(token)?;
        let client_id = decoded.footer.client_id();
        let (_, open) = self.load(&client_id)?;

        let mac_key = self.vault.session_mac_key();
        let footer = &decoded.footer;
        if !verify_session_mac(&mac_key, client_id.as_bytes(), footer.fields_json(), &open.current, footer.hmac()) {
            warn!(client_id = %client_id, "refused to re-sign foreign footer");
            return Err(AuthError::FieldsTampered.into());
        }

        let footer = Footer::sign(client_id, fields.clone(), |json| {
            session_mac(&mac_key, client_id.as_bytes(), json, &open.current)
        });
        Ok(Token { header: decoded.header, footer }.encode())
    }

    /// Encrypt a deinit challenge for the client that sent `token`.
    ///
    /// The request must authenticate (either generation). Only the holder
    /// of the shared key can recover `challenge` and prove possession.
    pub fn issue_challenge(&self, token: &str, challenge: &str) -> Result<IssuedChallenge, OatError> {
        let (_, open, verified) = self.verify(token)?;
        Self::match_generation(&open, &verified)?;

        let nonce = self.env.random_array();
        let sealed = oat_crypto::seal(open.shared_key.as_bytes(), &nonce, challenge.as_bytes());

        debug!(client_id = %verified.client_id, "issued deinit challenge");
        Ok(IssuedChallenge { client_id: verified.client_id, encrypted: STANDARD.encode(sealed) })
    }

    /// Erase all key material for a client. Idempotent.
    pub fn deinit(&self, client_id: &ClientId) -> Result<(), OatError> {
        self.store.remove_client(client_id)?;
        info!(client_id = %client_id, "deinitialized client");
        Ok(())
    }

    /// All initialized client ids.
    pub fn list_clients(&self) -> Result<Vec<ClientId>, OatError> {
        Ok(self.store.list_clients()?)
    }

    /// Open every sealed field of a client's record.
    ///
    /// Succeeds only if the record exists and the vault password is the one
    /// it was sealed under.
    pub fn check_client(&self, client_id: &ClientId) -> Result<(), OatError> {
        self.load(client_id).map(|_| ())
    }

    /// Decode a roll request, open its client's record, and run the
    /// generation-independent checks.
    fn verify(&self, token: &str) -> Result<(KeyRecord, OpenRecord, VerifiedRequest), OatError> {
        let decoded = Token::decode_request(token)?;
        let Header::RollRequest(header) = &decoded.header else {
            unreachable!("decode_request yields a roll request header");
        };

        let client_id = decoded.footer.client_id();
        let (record, open) = self.load(&client_id)?;

        let mac_key = self.vault.session_mac_key();
        let verified =
            auth::verify_request(self.domain(), header, &decoded.footer, &open.verifying_key, &mac_key)
                .inspect_err(|e| warn!(client_id = %client_id, error = %e, "rejected roll request"))?;

        Ok((record, open, verified))
    }

    fn match_generation(open: &OpenRecord, verified: &VerifiedRequest) -> Result<Generation, OatError> {
        match verified.matches(&open.current) {
            Ok(()) => Ok(Generation::Current),
            Err(AuthError::KeyMismatch) => match verified.matches(&open.previous) {
                Ok(()) => Ok(Generation::Previous),
                Err(_) => {
                    warn!(client_id = %verified.client_id, "api key matches neither generation");
                    Err(OatError::TokenMismatch(verified.client_id))
                },
            },
            Err(e) => Err(e.into()),
        }
    }

    fn load(&self, client_id: &ClientId) -> Result<(KeyRecord, OpenRecord), OatError> {
        let record = self.store.load_client(client_id)?.ok_or(OatError::UnknownClient(*client_id))?;

        let open = OpenRecord {
            shared_key: SharedKey::from_bytes(*self.vault.open_key(&record.shared_key)?),
            verifying_key: verifying_key_from_bytes(&*self.vault.open_key(&record.verifying_key)?)?,
            current: ApiKey::from_bytes(*self.vault.open_key(&record.ratchet.current)?),
            previous: ApiKey::from_bytes(*self.vault.open_key(&record.ratchet.previous)?),
        };
        Ok((record, open))
    }

    fn seal(&self, plaintext: &[u8]) -> Vec<u8> {
        self.vault.seal(&self.env.random_array(), plaintext)
    }

    fn response_token(
        &self,
        client_id: ClientId,
        shared_key: &SharedKey,
        api_key: &ApiKey,
        fields: &SessionFields,
        server_box_public: Option<[u8; 32]>,
    ) -> String {
        let nonce = self.env.random_array();
        let encrypted =
            EncryptedApiKey { nonce, ciphertext: wrap_api_key(shared_key, &nonce, api_key) };

        let header = match server_box_public {
            Some(server_box_public) => {
                Header::InitResponse(InitResponseHeader { server_box_public, api_key: encrypted })
            },
            None => Header::RollResponse(RollResponseHeader { api_key: encrypted }),
        };

        let mac_key = self.vault.session_mac_key();
        let footer = Footer::sign(client_id, fields.clone(), |json| {
            session_mac(&mac_key, client_id.as_bytes(), json, api_key)
        });

        Token { header, footer }.encode()
    }
}
