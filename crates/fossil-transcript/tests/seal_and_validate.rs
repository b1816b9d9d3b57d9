//! End-to-end sealing and validation of artifacts.

use fossil_core::{digest_unsealed, CanonicalValue, ContentDigest, FossilError};
use fossil_transcript::{
    validate, verify_ledger_against, AssemblerConfig, EnvelopeStage, LedgerAnchor, ScopeSet,
    SealedArtifact, TranscriptAssembler, TranscriptError, TranscriptLedger, TranscriptSigner,
};
use proptest::prelude::*;
use serde_json::json;

fn thermal_run(ticks: usize) -> ScopeSet {
    let yaml = r#"
components:
  plant:
    gain: 0.8
    lag: 2
  sensor:
    noise: 0.05
    kind: thermocouple
initial_state:
  temp: 18.5
  heater: false
controls:
  - {t: 0, setpoint: 21}
  - {t: 5, setpoint: 19}
"#;
    let mut set: ScopeSet = serde_yaml::from_str(yaml).unwrap();
    set.snapshots = (0..ticks)
        .map(|i| json!({"tick": i, "temp": 18.5 + i as f64 * 0.25}).into())
        .collect();
    set
}

fn seal(set: ScopeSet, parallel: bool) -> SealedArtifact {
    let mut config = AssemblerConfig::new("thermal-controller", "hvac");
    config.parallel = parallel;
    TranscriptAssembler::new(config).unwrap().assemble(set).unwrap()
}

#[test]
fn sealed_artifact_validates() {
    let artifact = seal(thermal_run(5), false);
    assert_eq!(artifact.envelope.stage(), EnvelopeStage::Sealed);
    let report = validate(&artifact).unwrap();
    assert!(report.is_sealed(), "{report:?}");
    let key = report.into_result().unwrap();
    assert!(key.address().starts_with("thermal-controller/hvac/"));
}

#[test]
fn two_corrupted_bodies_give_exactly_two_mismatches() {
    let mut artifact = seal(thermal_run(6), false);
    artifact.scopes.snapshots[2] = json!({"tick": 2, "temp": 99.0}).into();
    artifact
        .scopes
        .components
        .insert("sensor".into(), json!({"noise": 0.5, "kind": "thermocouple"}).into());

    let report = validate(&artifact).unwrap();
    let mut scopes: Vec<_> = report.mismatches.iter().map(|m| m.scope.clone()).collect();
    scopes.sort();
    assert_eq!(scopes, vec!["component:sensor", "snapshot[2]"]);
    assert!(report.unchecked.is_empty());
    assert!(report.into_result().is_err());
}

#[test]
fn stored_digest_without_body_is_missing_scope() {
    let mut artifact = seal(thermal_run(2), false);
    artifact.scopes.components.remove("plant");
    match validate(&artifact) {
        Err(TranscriptError::Core(FossilError::MissingScope(name))) => {
            assert_eq!(name, "component:plant")
        }
        other => panic!("expected missing scope, got {other:?}"),
    }
}

#[test]
fn zero_ticks_cannot_be_sealed() {
    let config = AssemblerConfig::new("thermal-controller", "hvac");
    let err = TranscriptAssembler::new(config)
        .unwrap()
        .assemble(thermal_run(0))
        .unwrap_err();
    assert!(matches!(err, TranscriptError::Core(FossilError::EmptyLeafSet)));
}

#[test]
fn resealing_a_sealed_transcript_is_circular() {
    let artifact = seal(thermal_run(2), false);
    let transcript = artifact.envelope.transcript.clone();
    let err = digest_unsealed(&transcript.scope().unwrap()).unwrap_err();
    assert!(matches!(
        err,
        FossilError::CircularDigestDependency { ref field, .. } if field == "transcript_digest"
    ));

    let mut envelope = artifact.envelope;
    assert!(matches!(
        envelope.seal(),
        Err(FossilError::CircularDigestDependency { .. })
    ));
}

#[test]
fn json_round_trip_preserves_validation() {
    let artifact = seal(thermal_run(3), false);
    let text = artifact.to_json_pretty().unwrap();
    let back = SealedArtifact::from_json(&text).unwrap();
    assert_eq!(back, artifact);
    assert!(validate(&back).unwrap().is_sealed());
}

#[test]
fn malformed_stored_digest_is_rejected_on_load() {
    let artifact = seal(thermal_run(1), false);
    let mut value = serde_json::to_value(&artifact).unwrap();
    value["envelope"]["transcript"]["merkle_root"] = json!("sha256:XYZ");
    let err = SealedArtifact::from_json(&value.to_string()).unwrap_err();
    assert!(matches!(err, TranscriptError::Serialization(_)));
    assert!(err.to_string().contains("malformed digest"), "{err}");
}

#[test]
fn ledger_root_matches_transcript_root() {
    let set = thermal_run(9);
    let mut ledger = TranscriptLedger::new();
    for snapshot in &set.snapshots {
        ledger.append(snapshot).unwrap();
    }
    let artifact = seal(set, false);
    assert_eq!(ledger.root(), artifact.envelope.transcript.merkle_root);
    assert_eq!(ledger.leaves(), artifact.envelope.transcript.snapshot_digests.as_slice());
}

#[test]
fn transcript_anchors_its_ledger() {
    let set = thermal_run(5);
    let mut ledger = TranscriptLedger::new();
    for snapshot in &set.snapshots {
        ledger.append(snapshot).unwrap();
    }
    let transcript = seal(set, false).envelope.transcript;
    let anchor = LedgerAnchor {
        merkle_root: transcript.merkle_root.unwrap(),
        count: Some(transcript.tick_count as usize),
    };
    assert!(verify_ledger_against(ledger.lines(), &anchor).unwrap().is_valid());

    let check = verify_ledger_against(&ledger.lines()[..3], &anchor).unwrap();
    assert!(!check.is_valid());
    assert!(!check.count_matches());
    let scopes: Vec<_> = check.mismatches.iter().map(|m| m.scope.as_str()).collect();
    assert_eq!(scopes, vec!["ledger.anchor"]);
}

struct HexSigner;

impl TranscriptSigner for HexSigner {
    fn sign(&self, transcript_digest: &ContentDigest) -> Result<String, TranscriptError> {
        Ok(format!("hex-sig:{}", transcript_digest.to_hex()))
    }
}

struct RefusingSigner;

impl TranscriptSigner for RefusingSigner {
    fn sign(&self, _: &ContentDigest) -> Result<String, TranscriptError> {
        Err(TranscriptError::Signing("key unavailable".into()))
    }
}

fn signed_config() -> AssemblerConfig {
    let mut config = AssemblerConfig::new("thermal-controller", "hvac");
    config.signer = Some("ops@plant-7".into());
    config
}

#[test]
fn signature_does_not_change_transcript_digest() {
    let unsigned = TranscriptAssembler::new(signed_config())
        .unwrap()
        .assemble(thermal_run(3))
        .unwrap();
    let signed = TranscriptAssembler::new(signed_config())
        .unwrap()
        .with_signer(Box::new(HexSigner))
        .assemble(thermal_run(3))
        .unwrap();

    let t_unsigned = &unsigned.envelope.transcript;
    let t_signed = &signed.envelope.transcript;
    assert_eq!(t_unsigned.transcript_digest, t_signed.transcript_digest);
    let attestation = t_signed.attestation.as_ref().unwrap();
    assert_eq!(attestation.signer, "ops@plant-7");
    assert_eq!(
        attestation.signature.as_deref(),
        Some(format!("hex-sig:{}", t_signed.transcript_digest.unwrap().to_hex()).as_str())
    );
    // The envelope covers the signature.
    assert_ne!(
        unsigned.envelope.artifact_digest,
        signed.envelope.artifact_digest
    );
    assert!(validate(&signed).unwrap().is_sealed());
}

#[test]
fn signer_errors_propagate() {
    let err = TranscriptAssembler::new(signed_config())
        .unwrap()
        .with_signer(Box::new(RefusingSigner))
        .assemble(thermal_run(1))
        .unwrap_err();
    assert!(matches!(err, TranscriptError::Signing(_)));
}

#[test]
fn yaml_and_json_scope_sets_seal_identically() {
    let from_yaml = thermal_run(2);
    let text = serde_json::to_string(&from_yaml).unwrap();
    let from_json: ScopeSet = serde_json::from_str(&text).unwrap();
    assert_eq!(
        seal(from_yaml, false).envelope.artifact_digest,
        seal(from_json, false).envelope.artifact_digest
    );
}

#[test]
fn component_key_order_is_irrelevant() {
    let mut a = thermal_run(1);
    let mut b = thermal_run(1);
    a.components.insert(
        "filter".into(),
        CanonicalValue::from(json!({"alpha": 0.1, "order": 2})),
    );
    b.components.insert(
        "filter".into(),
        serde_json::from_str::<CanonicalValue>(r#"{"order":2,"alpha":0.1}"#).unwrap(),
    );
    assert_eq!(
        seal(a, false).envelope.artifact_digest,
        seal(b, false).envelope.artifact_digest
    );
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn parallel_and_sequential_agree(ticks in 1usize..48) {
        let seq = seal(thermal_run(ticks), false);
        let par = seal(thermal_run(ticks), true);
        prop_assert_eq!(&seq, &par);
        prop_assert!(validate(&par).unwrap().is_sealed());
    }
}
