use alloc::borrow::ToOwned;
use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;

use ahash::RandomState;
use base64::display::Base64Display;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use hashbrown::HashMap;
use indexmap::IndexMap;
use json_ld::BlankId;
use json_ld::BlankIdBuf;
use json_ld::Iri;
use rdf_types::LexicalQuad;
use rdf_types::LexicalQuadRef;
use rdf_types::Literal;
use rdf_types::Quad;
use ssi::crypto::hashes::sha::Sha;
use ssi::rdf::urdna2015;

use common_crypto::sha256;
use common_crypto::HmacSha256Writer;
use common_types::log_error;
use common_types::ProofError;

pub(crate) struct Sha256Hasher;

impl Sha for Sha256Hasher {
    fn hash(data: &[u8]) -> Vec<u8> {
        sha256(data).to_vec()
    }
}

/// Input blank node id to canonical `c14nN` id, as produced by URDNA2015.
pub type CanonicalIdMap = IndexMap<BlankIdBuf, BlankIdBuf, RandomState>;

/// Input blank node id to the label written into statements.
pub type LabelMap = HashMap<BlankIdBuf, BlankIdBuf>;

/// Decides the label each canonical blank node carries in the final statements.
pub trait LabelMapFactory {
    fn label_for(&self, canonical_id: &BlankId) -> Result<BlankIdBuf, ProofError>;

    fn create_label_map(&self, canonical_ids: &CanonicalIdMap) -> Result<LabelMap, ProofError> {
        canonical_ids
            .iter()
            .map(|(input, canonical)| Ok((input.clone(), self.label_for(canonical)?)))
            .collect()
    }
}

fn blank_id(label: String) -> Result<BlankIdBuf, ProofError> {
    BlankIdBuf::new(label).map_err(|_| {
        log_error!(ProofError::UnderlyingCanonicalizationFailure(
            "invalid blank node label".into()
        ))
    })
}

/// `_:u` followed by the base64url HMAC of the canonical id. Used by ecdsa-sd-2023.
pub struct HmacLabeler<'a> {
    key: &'a [u8],
}

impl<'a> HmacLabeler<'a> {
    pub fn new(key: &'a [u8]) -> Self {
        Self { key }
    }

    fn digest(&self, canonical_id: &BlankId) -> Result<[u8; 32], ProofError> {
        let mut writer = HmacSha256Writer::new(self.key)?;
        writer.write(canonical_id.suffix().as_bytes());
        Ok(writer.finalize())
    }
}

impl LabelMapFactory for HmacLabeler<'_> {
    fn label_for(&self, canonical_id: &BlankId) -> Result<BlankIdBuf, ProofError> {
        let digest = self.digest(canonical_id)?;
        blank_id(format!(
            "_:u{}",
            Base64Display::new(&digest, &URL_SAFE_NO_PAD)
        ))
    }
}

/// HMAC labels sorted and replaced by their rank, `_:b0`, `_:b1`, ... Used by bbs-2023, whose
/// verifiers only ever see the ranks.
pub struct ShuffledHmacLabeler<'a>(HmacLabeler<'a>);

impl<'a> ShuffledHmacLabeler<'a> {
    pub fn new(key: &'a [u8]) -> Self {
        Self(HmacLabeler::new(key))
    }
}

impl LabelMapFactory for ShuffledHmacLabeler<'_> {
    fn label_for(&self, canonical_id: &BlankId) -> Result<BlankIdBuf, ProofError> {
        self.0.label_for(canonical_id)
    }

    fn create_label_map(&self, canonical_ids: &CanonicalIdMap) -> Result<LabelMap, ProofError> {
        let hmac_map = self.0.create_label_map(canonical_ids)?;
        let mut hmac_ids: Vec<_> = hmac_map.values().collect();
        hmac_ids.sort();

        hmac_map
            .iter()
            .map(|(input, hmac_id)| {
                let rank = hmac_ids.binary_search(&hmac_id).map_err(|_| {
                    log_error!(ProofError::UnderlyingCanonicalizationFailure(
                        "hmac label missing from its own ranking".into()
                    ))
                })?;
                Ok((input.clone(), blank_id(format!("_:b{rank}"))?))
            })
            .collect()
    }
}

/// Labels supplied by a derived proof, keyed by canonical id. A canonical id the proof did not
/// label makes the document unverifiable.
pub struct ExplicitLabeler {
    labels: HashMap<BlankIdBuf, BlankIdBuf>,
}

impl ExplicitLabeler {
    /// ecdsa-sd-2023 form: `N -> hmac bytes`, labelling `c14nN` as `_:u<base64url(bytes)>`.
    pub fn from_hmac_digests(map: &BTreeMap<usize, Vec<u8>>) -> Result<Self, ProofError> {
        let labels = map
            .iter()
            .map(|(n, digest)| {
                let label = format!("_:u{}", Base64Display::new(digest, &URL_SAFE_NO_PAD));
                Ok((blank_id(format!("_:c14n{n}"))?, blank_id(label)?))
            })
            .collect::<Result<_, ProofError>>()?;
        Ok(Self { labels })
    }

    /// bbs-2023 form: `N -> M`, labelling `c14nN` as `_:bM`.
    pub fn from_ranks(map: &BTreeMap<usize, usize>) -> Result<Self, ProofError> {
        let labels = map
            .iter()
            .map(|(n, m)| Ok((blank_id(format!("_:c14n{n}"))?, blank_id(format!("_:b{m}"))?)))
            .collect::<Result<_, ProofError>>()?;
        Ok(Self { labels })
    }
}

impl LabelMapFactory for ExplicitLabeler {
    fn label_for(&self, canonical_id: &BlankId) -> Result<BlankIdBuf, ProofError> {
        self.labels.get(canonical_id).cloned().ok_or_else(|| {
            log_error!(ProofError::InvalidProofEncoding(format!(
                "no label for blank node {canonical_id}"
            )))
        })
    }
}

pub(crate) fn canonical_id_map(quads: &[LexicalQuad]) -> CanonicalIdMap {
    let quads_ref = quads.iter().map(LexicalQuad::as_lexical_quad_ref);
    urdna2015::normalize::<Sha256Hasher, _>(quads_ref).into_substitution()
}

/// Renders quads as N-Quads lines, sorted by code point and without duplicates.
pub fn to_statements(quads: &[LexicalQuad]) -> Vec<String> {
    let mut lines: Vec<String> = quads.iter().map(|quad| format!("{quad} .\n")).collect();
    lines.sort();
    lines.dedup();
    lines
}

/// Canonicalizes `quads` and relabels their blank nodes through `labeler`.
pub(crate) fn label_replacement_canonicalize_nquads(
    labeler: &dyn LabelMapFactory,
    quads: &[LexicalQuad],
) -> Result<(Vec<String>, LabelMap), ProofError> {
    let canonical_ids = canonical_id_map(quads);
    let label_map = labeler.create_label_map(&canonical_ids)?;
    let statements = to_statements(&relabel_quads(&label_map, quads));
    Ok((statements, label_map))
}

pub fn relabel_quads(label_map: &LabelMap, quads: &[LexicalQuad]) -> Vec<LexicalQuad> {
    quads
        .iter()
        .map(|quad| relabel_quad(label_map, quad.as_lexical_quad_ref()))
        .collect()
}

fn relabel_quad(label_map: &LabelMap, quad: LexicalQuadRef) -> LexicalQuad {
    Quad(
        relabel_id(label_map, quad.0),
        quad.1.to_owned(),
        relabel_term(label_map, quad.2),
        quad.3.map(|g| relabel_id(label_map, g)),
    )
}

fn relabel_id(label_map: &LabelMap, id: rdf_types::Id<&Iri, &BlankId>) -> rdf_types::Id {
    match id {
        rdf_types::Id::Iri(i) => rdf_types::Id::Iri(i.to_owned()),
        rdf_types::Id::Blank(b) => rdf_types::Id::Blank(match label_map.get(b) {
            Some(c) => c.clone(),
            None => b.to_owned(),
        }),
    }
}

fn relabel_term(
    label_map: &LabelMap,
    term: rdf_types::Term<rdf_types::Id<&Iri, &BlankId>, &Literal>,
) -> rdf_types::Term {
    match term {
        rdf_types::Term::Id(id) => rdf_types::Term::Id(relabel_id(label_map, id)),
        rdf_types::Term::Literal(l) => rdf_types::Term::Literal(l.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical_ids(n: usize) -> CanonicalIdMap {
        (0..n)
            .map(|i| {
                (
                    BlankIdBuf::new(format!("_:input{i}")).unwrap(),
                    BlankIdBuf::new(format!("_:c14n{i}")).unwrap(),
                )
            })
            .collect()
    }

    #[test]
    fn test_hmac_labels() {
        let key = [7u8; 32];
        let labeler = HmacLabeler::new(&key);
        let map = labeler.create_label_map(&canonical_ids(3)).unwrap();
        assert_eq!(map.len(), 3);
        let label = &map[&BlankIdBuf::new("_:input1".into()).unwrap()];
        assert!(label.as_str().starts_with("_:u"));
        assert_eq!(label.as_str().len(), 3 + 43);

        let mut writer = HmacSha256Writer::new(&key).unwrap();
        writer.write(b"c14n1");
        let expected = format!(
            "_:u{}",
            Base64Display::new(&writer.finalize(), &URL_SAFE_NO_PAD)
        );
        assert_eq!(label.as_str(), expected);
    }

    #[test]
    fn test_shuffled_labels_are_ranks() {
        let key = [7u8; 32];
        let ids = canonical_ids(12);
        let hmac = HmacLabeler::new(&key).create_label_map(&ids).unwrap();
        let ranked = ShuffledHmacLabeler::new(&key).create_label_map(&ids).unwrap();

        let mut by_hmac: Vec<_> = hmac.iter().collect();
        by_hmac.sort_by(|a, b| a.1.cmp(b.1));
        for (rank, (input, _)) in by_hmac.into_iter().enumerate() {
            assert_eq!(ranked[input].as_str(), format!("_:b{rank}"));
        }
    }

    #[test]
    fn test_explicit_labels() {
        let ranks = BTreeMap::from([(0, 3), (1, 0)]);
        let labeler = ExplicitLabeler::from_ranks(&ranks).unwrap();
        let c14n0 = BlankIdBuf::new("_:c14n0".into()).unwrap();
        assert_eq!(labeler.label_for(&c14n0).unwrap().as_str(), "_:b3");

        let map = labeler.create_label_map(&canonical_ids(2)).unwrap();
        assert_eq!(map[&BlankIdBuf::new("_:input1".into()).unwrap()].as_str(), "_:b0");

        assert!(matches!(
            labeler.create_label_map(&canonical_ids(3)),
            Err(ProofError::InvalidProofEncoding(_))
        ));

        let digests = BTreeMap::from([(0, vec![0xffu8; 32])]);
        let labeler = ExplicitLabeler::from_hmac_digests(&digests).unwrap();
        assert_eq!(
            labeler.label_for(&c14n0).unwrap().as_str(),
            "_:u__________________________________________8"
        );
    }

    #[test]
    fn test_statements_sorted_and_unique() {
        let iri = |s: &str| json_ld::IriBuf::new(s.into()).unwrap();
        let blank = |s: &str| rdf_types::Id::Blank(BlankIdBuf::new(s.into()).unwrap());
        let p = iri("https://example.org/p");
        let quads = vec![
            Quad(blank("_:b2"), p.clone(), rdf_types::Term::Id(blank("_:b10")), None),
            Quad(blank("_:b10"), p.clone(), rdf_types::Term::Id(blank("_:b2")), None),
            Quad(blank("_:b2"), p.clone(), rdf_types::Term::Id(blank("_:b10")), None),
        ];
        assert_eq!(
            to_statements(&quads),
            [
                "_:b10 <https://example.org/p> _:b2 .\n",
                "_:b2 <https://example.org/p> _:b10 .\n",
            ]
        );
    }
}
