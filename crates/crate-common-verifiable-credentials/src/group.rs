//! The canonicalize-and-group engine every suite operation is built on.

use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use hashbrown::HashSet;
use json_ld::context_processing::Options;
use json_ld::context_processing::Process;
use json_ld::context_processing::Processed;
use json_ld::syntax::Context;
use json_ld::syntax::TryFromJson;
use json_ld::BlankIdBuf;
use json_ld::Compact;
use json_ld::ExpandedDocument;
use json_ld::IriBuf;
use json_ld::JsonLdProcessor;
use json_ld::RemoteDocument;
use log::debug;
use log::trace;
use rdf_types::generator;
use rdf_types::LexicalQuad;
use serde_json::Value;
use ssi::rdf::urdna2015;

use common_crypto::Sha256Writer;
use common_crypto::SHA256_LEN;
use common_types::log_error;
use common_types::strict_uint;
use common_types::ProofError;

use crate::canonicalize::canonical_id_map;
use crate::canonicalize::label_replacement_canonicalize_nquads;
use crate::canonicalize::relabel_quads;
use crate::canonicalize::to_statements;
use crate::canonicalize::LabelMap;
use crate::canonicalize::LabelMapFactory;
use crate::canonicalize::Sha256Hasher;
use crate::json_pointer::JsonPointerBuf;
use crate::select::select_json_ld;
use crate::skolemize::deskolemize_nquads;
use crate::skolemize::skolemized_to_deskolemized_nquads;
use crate::skolemize::Skolemize;
use crate::StaticLoader;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GroupName {
    Mandatory,
    Selective,
    Combined,
}

impl fmt::Display for GroupName {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            GroupName::Mandatory => "mandatory",
            GroupName::Selective => "selective",
            GroupName::Combined => "combined",
        })
    }
}

/// Full-document statement indexes split by whether the group's pointers select them.
#[derive(Debug, Default)]
pub struct StatementGroup {
    pub matching: BTreeMap<usize, String>,
    pub non_matching: BTreeMap<usize, String>,
    /// The group's selection as quads over the document's own blank node ids, before labelling.
    pub deskolemized_quads: Vec<LexicalQuad>,
}

pub struct CanonicalizedAndGrouped {
    pub statements: Vec<String>,
    pub label_map: LabelMap,
    pub groups: BTreeMap<GroupName, StatementGroup>,
}

impl CanonicalizedAndGrouped {
    pub fn group(&self, name: GroupName) -> Result<&StatementGroup, ProofError> {
        self.groups.get(&name).ok_or_else(|| {
            log_error!(ProofError::MalformedInput(format!(
                "group {name} was not requested"
            )))
        })
    }
}

fn canonicalization_failure(what: &str, e: impl fmt::Display) -> ProofError {
    log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
        "{what}: {e}"
    )))
}

pub(crate) async fn expand_document(
    value: Value,
    loader: &mut StaticLoader,
) -> Result<ExpandedDocument, ProofError> {
    let input: RemoteDocument<IriBuf, json_syntax::Value> = RemoteDocument::new(
        Option::<IriBuf>::None,
        "application/ld+json".parse().ok(),
        json_ld::syntax::Value::from(value),
    );
    input
        .expand(loader)
        .await
        .map_err(|e| canonicalization_failure("failed to expand JSON-LD", e))
}

async fn document_to_quads(
    value: Value,
    loader: &mut StaticLoader,
) -> Result<Vec<LexicalQuad>, ProofError> {
    let expanded = expand_document(value, loader).await?;
    linked_data::to_lexical_quads(generator::Blank::new(), &expanded)
        .map_err(|e| canonicalization_failure("failed to convert to quads", e))
}

/// Canonical N-Quads of a proof configuration, which must carry the secured document's
/// `@context`.
pub async fn canonicalize_proof_config(
    config: &Value,
    loader: &mut StaticLoader,
) -> Result<String, ProofError> {
    let quads = document_to_quads(config.clone(), loader).await?;
    Ok(
        urdna2015::normalize::<Sha256Hasher, _>(
            quads.iter().map(LexicalQuad::as_lexical_quad_ref),
        )
        .into_nquads(),
    )
}

/// `sha256` of the canonical proof configuration with `@context` taken from the document.
pub async fn hash_proof_config(
    proof_config: &Value,
    document_context: &Value,
    loader: &mut StaticLoader,
) -> Result<[u8; SHA256_LEN], ProofError> {
    let mut config = proof_config.clone();
    let map = config.as_object_mut().ok_or_else(|| {
        log_error!(ProofError::MalformedInput("proof is not an object".into()))
    })?;
    map.remove("proofValue");
    map.insert("@context".into(), document_context.clone());
    let canonical = canonicalize_proof_config(&config, loader).await?;
    trace!("canonical proof configuration:\n{canonical}");
    Ok(common_crypto::sha256(canonical))
}

/// `sha256` over the concatenated statements, in the order given.
pub fn hash_statements<'a, I>(statements: I) -> [u8; SHA256_LEN]
where
    I: IntoIterator<Item = &'a String>,
{
    let mut writer = Sha256Writer::new();
    for statement in statements {
        writer.write(statement.as_bytes());
    }
    writer.finalize()
}

/// Canonicalizes a document with no grouping, the way a verifier holding only a label map does.
pub async fn canonicalize_with_labeler(
    document: &Value,
    labeler: &dyn LabelMapFactory,
    loader: &mut StaticLoader,
) -> Result<(Vec<String>, LabelMap), ProofError> {
    let quads = document_to_quads(document.clone(), loader).await?;
    label_replacement_canonicalize_nquads(labeler, &quads)
}

/// Turns `document` into sorted canonical statements labelled by `labeler`, and for each named
/// group of JSON pointers, works out which of those statements the group selects.
///
/// Selections are taken from a skolemized copy of the document so that the nodes they contain
/// keep the identity they have in the full document. All groups come from this single pass, so
/// their indexes are directly comparable.
pub async fn canonicalize_and_group(
    document: &Value,
    labeler: &dyn LabelMapFactory,
    group_specs: &[(GroupName, &[JsonPointerBuf])],
    loader: &mut StaticLoader,
) -> Result<CanonicalizedAndGrouped, ProofError> {
    let context_json = document.get("@context").cloned().unwrap_or(Value::Null);
    let context = Context::try_from_json(json_ld::syntax::Value::from(context_json.clone()))
        .map_err(|e| canonicalization_failure("failed to parse context", e))?;

    let mut expanded_document = expand_document(document.clone(), loader).await?;
    expanded_document.canonicalize();
    let mut skolemize = Skolemize::new()?;
    let skolemized_expanded_document = skolemize.expanded_document(expanded_document);

    let active_context = json_ld::Context::default();
    let vocabulary = &mut ();
    let processed_context: Processed<IriBuf, BlankIdBuf> = context
        .process_full(
            vocabulary,
            &active_context,
            loader,
            None,
            Options::default(),
        )
        .await
        .map_err(|e| canonicalization_failure("failed to process context", e))?;

    let skolemized_compact_document = skolemized_expanded_document
        .compact(processed_context.as_ref(), loader)
        .await
        .map_err(|e| canonicalization_failure("failed to compact document", e))?;
    let mut skolemized_compact_document = skolemized_compact_document.into_serde_json();
    let compact_map = skolemized_compact_document.as_object_mut().ok_or_else(|| {
        log_error!(ProofError::UnderlyingCanonicalizationFailure(
            "compacted document is not an object".into()
        ))
    })?;
    compact_map.insert("@context".into(), context_json);

    let mut deskolemized_quads =
        linked_data::to_lexical_quads(generator::Blank::new(), &skolemized_expanded_document)
            .map_err(|e| canonicalization_failure("failed to convert to quads", e))?;
    deskolemize_nquads(&skolemize.urn_scheme, &mut deskolemized_quads);

    let (statements, label_map) =
        label_replacement_canonicalize_nquads(labeler, &deskolemized_quads)?;
    debug!(
        "canonicalized {} statements, {} blank nodes",
        statements.len(),
        label_map.len()
    );

    let mut groups = BTreeMap::new();
    for &(name, pointers) in group_specs {
        let mut group = StatementGroup::default();
        if let Some(selection) = select_json_ld(&skolemized_compact_document, pointers)? {
            group.deskolemized_quads =
                skolemized_to_deskolemized_nquads(loader, &skolemize.urn_scheme, selection)
                    .await?;
        }
        let selected: HashSet<String> =
            to_statements(&relabel_quads(&label_map, &group.deskolemized_quads))
                .into_iter()
                .collect();

        for (i, statement) in statements.iter().enumerate() {
            if selected.contains(statement) {
                group.matching.insert(i, statement.clone());
            } else {
                group.non_matching.insert(i, statement.clone());
            }
        }
        debug!(
            "group {name}: {} matching, {} non-matching",
            group.matching.len(),
            group.non_matching.len()
        );
        groups.insert(name, group);
    }

    Ok(CanonicalizedAndGrouped {
        statements,
        label_map,
        groups,
    })
}

/// Index bookkeeping a holder needs to turn one grouping pass into a derived proof.
#[derive(Debug, PartialEq, Eq)]
pub struct DisclosureIndexes {
    /// Position of each mandatory statement among the combined (revealed) statements.
    pub mandatory_in_combined: Vec<usize>,
    /// Position of each selectively revealed statement among the non-mandatory statements.
    pub selective_in_non_mandatory: Vec<usize>,
}

impl DisclosureIndexes {
    pub fn new(grouped: &CanonicalizedAndGrouped) -> Result<Self, ProofError> {
        let mandatory = grouped.group(GroupName::Mandatory)?;
        let selective = grouped.group(GroupName::Selective)?;
        let combined = grouped.group(GroupName::Combined)?;

        let combined_indexes: Vec<usize> = combined.matching.keys().copied().collect();
        let mandatory_in_combined = mandatory
            .matching
            .keys()
            .map(|k| {
                combined_indexes.binary_search(k).map_err(|_| {
                    log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
                        "mandatory statement {k} is not among the revealed statements"
                    )))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let non_mandatory_indexes: Vec<usize> = mandatory.non_matching.keys().copied().collect();
        let selective_in_non_mandatory = selective
            .matching
            .keys()
            .filter_map(|k| non_mandatory_indexes.binary_search(k).ok())
            .collect();

        Ok(Self {
            mandatory_in_combined,
            selective_in_non_mandatory,
        })
    }
}

/// Maps each `c14nN` id of the revealed statements, as a verifier will see them, to the label
/// the full document gave that node.
pub fn verifier_label_map(
    grouped: &CanonicalizedAndGrouped,
) -> Result<BTreeMap<usize, BlankIdBuf>, ProofError> {
    let combined = grouped.group(GroupName::Combined)?;
    canonical_id_map(&combined.deskolemized_quads)
        .iter()
        .map(|(input, canonical)| {
            let n = canonical
                .suffix()
                .strip_prefix("c14n")
                .and_then(strict_uint::<usize>)
                .ok_or_else(|| {
                    log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
                        "unexpected canonical id {canonical}"
                    )))
                })?;
            let label = grouped.label_map.get(input).ok_or_else(|| {
                log_error!(ProofError::UnderlyingCanonicalizationFailure(format!(
                    "revealed node {input} has no label"
                )))
            })?;
            Ok((n, label.clone()))
        })
        .collect()
}
