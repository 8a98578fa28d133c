//! Client engine: key exchange, rolling, and teardown.
//!
//! The client keeps exactly one token per domain, the latest response the
//! server sent. It never computes footer HMACs; it forwards the server's
//! footer verbatim and proves possession of the api key by signing it.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use oat_crypto::{
    BoxKeyPair, CryptoError, SharedKey, SigningKey, Vault, derive_client_id, sign_api_key,
    unwrap_api_key,
};
use oat_proto::{
    ClientId, Header, InitRequest, InitResponseHeader, ProtocolError, RollRequestHeader,
    RollResponseHeader, SessionFields, Token, encode_with_footer, footer_segment, session_data,
};
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::{
    env::Environment,
    error::OatError,
    storage::{ClientRecord, ClientStore},
    transport::Transport,
};

/// Client side of the OAT protocol.
#[derive(Clone)]
pub struct OatClient<E, C>
where
    E: Environment,
    C: ClientStore,
{
    env: E,
    store: C,
    vault: Vault,
}

impl<E, C> OatClient<E, C>
where
    E: Environment,
    C: ClientStore,
{
    /// Create a client engine.
    pub fn new(env: E, store: C, vault: Vault) -> Self {
        Self { env, store, vault }
    }

    /// Underlying identity store.
    pub fn store(&self) -> &C {
        &self.store
    }

    /// Run key exchange with the server at `domain`.
    ///
    /// Sends a fresh box key and signing key through `transport`, derives
    /// the shared key from the init response, and checks that the locally
    /// computed client id equals the one the server put in the footer. Any
    /// previous identity for `domain` is replaced.
    pub fn init<T: Transport>(&self, domain: &str, transport: &mut T) -> Result<ClientId, OatError> {
        let box_pair = BoxKeyPair::from_seed(self.env.random_array());
        let signing_key = SigningKey::from_bytes(&self.env.random_array());

        let request = InitRequest {
            box_public: box_pair.public_bytes(),
            sign_public: signing_key.verifying_key().to_bytes(),
        };
        let response = transport.send(&request.encode())?;
        let response = response.trim();

        let token = Token::decode_response(response)?;
        let Header::InitResponse(header) = &token.header else {
            return Err(ProtocolError::InvalidLength {
                segment: "init response header",
                expected: InitResponseHeader::SIZE,
                actual: token.header.to_bytes().len(),
            }
            .into());
        };

        let shared_key = box_pair.diffie_hellman(&header.server_box_public)?;
        let computed = ClientId::from_bytes(derive_client_id(&shared_key));
        let received = token.footer.client_id();
        if computed != received {
            warn!(domain, computed = %computed, received = %received, "client id mismatch");
            return Err(OatError::IdentityMismatch { computed, received });
        }

        let record = ClientRecord {
            client_id: computed,
            shared_key: self.seal(shared_key.as_bytes()),
            signing_key: self.seal(signing_key.as_bytes()),
            token: self.seal(response.as_bytes()),
        };
        self.store.store_identity(domain, &record)?;

        debug!(domain, client_id = %computed, "initialized identity");
        Ok(computed)
    }

    /// Roll the stored token for `domain` through `transport`.
    ///
    /// Recovers the current api key, signs it with the domain, and sends a
    /// roll request carrying the stored footer. The server's response
    /// replaces the stored token in full. On any failure the stored token
    /// is left untouched, so the next roll can resync.
    pub fn roll<T: Transport>(&self, domain: &str, transport: &mut T) -> Result<String, OatError> {
        let request = self.roll_request(domain)?;
        let response = transport.send(&request)?;
        let response = response.trim();

        let record = self.load(domain)?;
        let token = Token::decode_response(response)?;
        if !matches!(token.header, Header::RollResponse(_)) {
            return Err(ProtocolError::InvalidLength {
                segment: "roll response header",
                expected: RollResponseHeader::SIZE,
                actual: token.header.to_bytes().len(),
            }
            .into());
        }
        if token.footer.client_id() != record.client_id {
            return Err(OatError::IdentityMismatch {
                computed: record.client_id,
                received: token.footer.client_id(),
            });
        }

        self.store.replace_token(domain, &self.seal(response.as_bytes()))?;

        debug!(domain, client_id = %record.client_id, "stored rolled token");
        Ok(response.to_owned())
    }

    /// Build the roll request for the stored token without sending it.
    pub fn roll_request(&self, domain: &str) -> Result<String, OatError> {
        let record = self.load(domain)?;
        let shared_key = SharedKey::from_bytes(*self.vault.open_key(&record.shared_key)?);
        let signing_key = SigningKey::from_bytes(&*self.vault.open_key(&record.signing_key)?);
        let stored = self.open_token(&record)?;

        let token = Token::decode_response(&stored)?;
        let Some(encrypted) = token.header.encrypted_api_key() else {
            unreachable!("response headers always carry an encrypted api key");
        };
        let api_key = unwrap_api_key(&shared_key, &encrypted.nonce, &encrypted.ciphertext);

        let header = RollRequestHeader::new(sign_api_key(&signing_key, &api_key, domain))?;
        Ok(encode_with_footer(&Header::RollRequest(header), footer_segment(&stored)?))
    }

    /// Latest token received from `domain`.
    pub fn token(&self, domain: &str) -> Result<String, OatError> {
        let record = self.load(domain)?;
        Ok(self.open_token(&record)?.to_string())
    }

    /// Session fields in the stored token.
    ///
    /// Read WITHOUT verifying the footer HMAC, which only the server can do.
    pub fn session_data(&self, domain: &str) -> Result<SessionFields, OatError> {
        let record = self.load(domain)?;
        Ok(session_data(&self.open_token(&record)?)?)
    }

    /// Client id assigned for `domain`.
    pub fn client_id(&self, domain: &str) -> Result<ClientId, OatError> {
        Ok(self.load(domain)?.client_id)
    }

    /// Erase the identity for `domain` unconditionally. Idempotent.
    pub fn deinit(&self, domain: &str) -> Result<(), OatError> {
        self.store.remove_identity(domain)?;
        info!(domain, "deinitialized identity");
        Ok(())
    }

    /// Answer a server deinit challenge, then erase the identity.
    ///
    /// `encrypted` is the base64 challenge from the server. The decrypted
    /// challenge is sent through `transport`; local key material is erased
    /// only if the transport succeeds.
    pub fn deinit_with_challenge<T: Transport>(
        &self,
        domain: &str,
        encrypted: &str,
        transport: &mut T,
    ) -> Result<(), OatError> {
        let record = self.load(domain)?;
        let shared_key = SharedKey::from_bytes(*self.vault.open_key(&record.shared_key)?);

        let blob = STANDARD
            .decode(encrypted.trim())
            .map_err(|_| ProtocolError::InvalidBase64 { segment: "challenge" })?;
        let plaintext = oat_crypto::open(shared_key.as_bytes(), &blob)?;
        let challenge = std::str::from_utf8(&plaintext).map_err(|_| CryptoError::DecryptionFailed)?;

        transport.send(challenge)?;
        self.deinit(domain)
    }

    /// All domains with a stored identity.
    pub fn list_domains(&self) -> Result<Vec<String>, OatError> {
        Ok(self.store.list_domains()?)
    }

    fn load(&self, domain: &str) -> Result<ClientRecord, OatError> {
        self.store.load_identity(domain)?.ok_or_else(|| OatError::UnknownDomain(domain.to_owned()))
    }

    fn open_token(&self, record: &ClientRecord) -> Result<Zeroizing<String>, OatError> {
        let plaintext = self.vault.open(&record.token)?;
        let token = String::from_utf8(plaintext.to_vec()).map_err(|_| CryptoError::DecryptionFailed)?;
        Ok(Zeroizing::new(token))
    }

    fn seal(&self, plaintext: &[u8]) -> Vec<u8> {
        self.vault.seal(&self.env.random_array(), plaintext)
    }
}
