use alloc::string::String;
use alloc::vec::Vec;

use json_ld::BlankId;
use json_ld::BlankIdBuf;
use json_ld::ExpandedDocument;
use json_ld::IriBuf;
use rdf_types::generator;
use rdf_types::Id;
use rdf_types::LexicalQuad;

use common_crypto::generate_random;
use common_types::log_error;
use common_types::ProofError;

use crate::group::expand_document;
use crate::StaticLoader;

/// Replaces blank nodes with `urn:bnid:` IRIs so that nodes keep their identity through
/// compaction and JSON pointer selection. Nodes with no identifier at all get
/// `urn:bnid:<uuid>_<n>`, the uuid being fresh for every document.
pub struct Skolemize {
    pub urn_scheme: String,
    random_string: String,
    count: u32,
}

impl rdf_types::Generator for Skolemize {
    fn next(&mut self, _vocabulary: &mut ()) -> Id {
        Id::Iri(self.fresh_blank_id())
    }
}

impl Skolemize {
    pub fn new() -> Result<Self, ProofError> {
        let uuid_bytes: [u8; 16] = generate_random(16)?
            .try_into()
            .map_err(|_| log_error!(ProofError::KeyMaterial("short random read".into())))?;
        let skolemize = Self {
            urn_scheme: "bnid".into(),
            random_string: uuid::Builder::from_random_bytes(uuid_bytes)
                .into_uuid()
                .to_string(),
            count: 0,
        };
        IriBuf::new(skolemize.skolem_id(0)).map_err(|_| {
            log_error!(ProofError::UnderlyingCanonicalizationFailure(
                "skolem id prefix is not an IRI".into()
            ))
        })?;
        Ok(skolemize)
    }

    fn skolem_id(&self, n: u32) -> String {
        format!("urn:{}:{}_{}", self.urn_scheme, self.random_string, n)
    }

    #[cfg(test)]
    pub fn with_prefix(uuid: uuid::Uuid) -> Self {
        Self {
            urn_scheme: "bnid".into(),
            random_string: uuid.to_string(),
            count: 0,
        }
    }

    pub fn fresh_blank_id(&mut self) -> IriBuf {
        // `new` checked the prefix, and ids only differ in their decimal counter.
        let id = IriBuf::new(self.skolem_id(self.count))
            .expect("skolem id prefix checked in Skolemize::new");
        self.count += 1;
        id
    }

    fn blank_id(&self, blank_id: &BlankId) -> Option<IriBuf> {
        IriBuf::new(format!("urn:{}:{}", self.urn_scheme, blank_id.suffix())).ok()
    }

    pub fn expanded_document(&mut self, expanded: ExpandedDocument) -> ExpandedDocument {
        let mut result = expanded.map_ids(
            |i| i,
            |id| match id {
                json_ld::Id::Valid(Id::Blank(b)) => match self.blank_id(&b) {
                    Some(iri) => json_ld::Id::Valid(Id::Iri(iri)),
                    None => json_ld::Id::Valid(Id::Blank(b)),
                },
                other => other,
            },
        );

        result.identify_all(self);
        result
    }
}

/// Expands a skolemized (compact, JSON) document and turns it back into quads over blank nodes.
pub(crate) async fn skolemized_to_deskolemized_nquads(
    loader: &mut StaticLoader,
    urn_scheme: &str,
    document: serde_json::Value,
) -> Result<Vec<LexicalQuad>, ProofError> {
    let expanded = expand_document(document, loader).await?;
    let mut quads = linked_data::to_lexical_quads(generator::Blank::new(), &expanded)
        .map_err(|e| {
            log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
                "failed to convert selection to quads: {e}"
            )))
        })?;
    deskolemize_nquads(urn_scheme, &mut quads);
    Ok(quads)
}

pub(crate) fn deskolemize_nquads(urn_scheme: &str, quads: &mut [LexicalQuad]) {
    for quad in quads {
        deskolemize_id(urn_scheme, &mut quad.0);
        deskolemize_term(urn_scheme, &mut quad.2);

        if let Some(g) = quad.graph_mut() {
            deskolemize_id(urn_scheme, g);
        }
    }
}

fn deskolemize_id(urn_scheme: &str, id: &mut Id) {
    let Id::Iri(iri) = id else {
        return;
    };
    if iri.scheme().as_str() != "urn" {
        return;
    }
    let blank = iri
        .path()
        .split_once(':')
        .filter(|(prefix, _)| *prefix == urn_scheme)
        .and_then(|(_, suffix)| BlankIdBuf::from_suffix(suffix).ok());
    if let Some(blank) = blank {
        *id = Id::Blank(blank);
    }
}

fn deskolemize_term(urn_scheme: &str, term: &mut rdf_types::Term) {
    if let rdf_types::Term::Id(id) = term {
        deskolemize_id(urn_scheme, id)
    }
}
