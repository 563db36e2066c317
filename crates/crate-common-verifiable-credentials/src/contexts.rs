//! Bundled JSON-LD contexts. Documents are only ever expanded against these; nothing is fetched.

use alloc::collections::BTreeMap;

use json_ld::syntax::Parse;
use json_ld::syntax::Value;
use json_ld::IriBuf;
use json_ld::RemoteDocument;

use crate::CREDENTIALS_CONTEXT_V2_URL;
use crate::CREDENTIALS_EXAMPLES_V2_URL;
use crate::DATA_INTEGRITY_V2_URL;

pub type StaticLoader = BTreeMap<IriBuf, RemoteDocument>;

const BUNDLED: [(&str, &str); 3] = [
    (
        CREDENTIALS_CONTEXT_V2_URL,
        include_str!("../contexts/credentials-v2.jsonld"),
    ),
    (
        CREDENTIALS_EXAMPLES_V2_URL,
        include_str!("../contexts/credentials-examples-v2.jsonld"),
    ),
    (
        DATA_INTEGRITY_V2_URL,
        include_str!("../contexts/data-integrity-v2.jsonld"),
    ),
];

/// A fresh copy of the static loader. Each request gets its own since expansion takes the loader
/// mutably.
pub fn new_static_loader() -> StaticLoader {
    lazy_static::lazy_static! {
        static ref LOADER: StaticLoader = make_static_loader();
    }
    LOADER.clone()
}

// The bundled documents are compile time constants; a parse failure here is a build defect.
fn make_static_loader() -> StaticLoader {
    BUNDLED
        .iter()
        .map(|&(url, body)| {
            let iri = IriBuf::new(url.into()).expect("bundled context url is an IRI");
            let document = RemoteDocument::new(
                Some(iri.clone()),
                Some("application/ld+json".parse().expect("static media type")),
                Value::parse_str(body).expect("bundled context is JSON").0,
            );
            (iri, document)
        })
        .collect()
}
