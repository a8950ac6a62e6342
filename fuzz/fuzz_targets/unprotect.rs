#![no_main]

use libfuzzer_sys::fuzz_target;
use meditrack_envelope::{MediTrack, ProtectedRecord};
use once_cell::sync::Lazy;
use rsa::{RsaPrivateKey, RsaPublicKey};

static KEYPAIR: Lazy<(RsaPrivateKey, RsaPublicKey)> = Lazy::new(|| {
    let sk = RsaPrivateKey::new(&mut rand_core::OsRng, 1024).unwrap();
    let pk = RsaPublicKey::from(&sk);
    (sk, pk)
});

fuzz_target!(|data: &[u8]| {
    let Ok(protected) = serde_json::from_slice::<ProtectedRecord>(data) else {
        return;
    };

    let mt = MediTrack::new();
    let (sk, pk) = &*KEYPAIR;

    let _ = mt.unprotect(&protected, sk, &[]);
    let _ = mt.check(&protected, pk);
});
