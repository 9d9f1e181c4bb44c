// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Fixed RSA keys and token minting for tests.

use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::json;

use super::claims::AccessTokenClaims;

pub const TEST_KID: &str = "test-key-1";
pub const TEST_ISSUER: &str = "https://cognito-idp.eu-west-1.amazonaws.com/eu-west-1_TestPool";

const SIGNING_KEY_PEM: &[u8] = include_bytes!("testdata/signing_key.pem");
const FOREIGN_KEY_PEM: &[u8] = include_bytes!("testdata/foreign_key.pem");

/// Public half of `signing_key.pem`.
const SIGNING_KEY_N: &str = "5IdlUmFcYqoOg2Ae-FAHyuX8L7mLuw42m6g5TtXS15l0K7KglXbC0tbslZ2dfu8-E-_8csKKeRgeb09QVneGBvoQakd2TpVI7h_Tn1yxyvcDCaKfLivQ_yjbqd21Q4g65x6ZZYjLmSvs5O6gxIBv27_p4tq5la7eyP1KIJd1mfO23rjCLyv10flQ-BJXUgypIEJ42AVzTSB_7323BJknR7ZjArepXc6zYb_vCp-2fDfV8XUB-RafsHvazm1yUGqFcg5ql6V-9aPHZbvrqWeymjR2-t2aSLdsjA0nu7FztbcgLY5crMKGTXtUyVg70IwJgaohvnfKs4Xg8xNvdgQb6w";
const SIGNING_KEY_E: &str = "AQAB";

/// JWKS publishing the test signing key under [`TEST_KID`].
pub fn signing_jwks() -> JwkSet {
    serde_json::from_value(json!({
        "keys": [{
            "kty": "RSA",
            "kid": TEST_KID,
            "alg": "RS256",
            "use": "sig",
            "n": SIGNING_KEY_N,
            "e": SIGNING_KEY_E
        }]
    }))
    .expect("static JWKS parses")
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Claims of an access token valid for the next hour.
pub fn valid_claims(sub: &str) -> AccessTokenClaims {
    AccessTokenClaims {
        sub: sub.to_string(),
        exp: now() + 3600,
        iss: TEST_ISSUER.to_string(),
        iat: Some(now()),
        token_use: Some("access".to_string()),
        client_id: Some("test-client-id".to_string()),
        username: Some(sub.to_string()),
    }
}

/// Claims that expired well beyond the verifier's leeway.
pub fn expired_claims(sub: &str) -> AccessTokenClaims {
    AccessTokenClaims {
        exp: now() - 3600,
        iat: Some(now() - 7200),
        ..valid_claims(sub)
    }
}

fn sign<T: Serialize>(claims: &T, kid: Option<&str>, pem: &[u8]) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    let key = EncodingKey::from_rsa_pem(pem).expect("test key parses");
    encode(&header, claims, &key).expect("token encodes")
}

/// Token signed by the published test key.
pub fn mint(claims: &AccessTokenClaims, kid: Option<&str>) -> String {
    sign(claims, kid, SIGNING_KEY_PEM)
}

/// Token claiming [`TEST_KID`] but signed by an unrelated key.
pub fn mint_forged(claims: &AccessTokenClaims) -> String {
    sign(claims, Some(TEST_KID), FOREIGN_KEY_PEM)
}

/// Token with arbitrary claims, signed by the published test key.
pub fn mint_json(claims: &serde_json::Value) -> String {
    sign(claims, Some(TEST_KID), SIGNING_KEY_PEM)
}
