//! Tests for the patch graph: mutation operations, validation against the
//! catalog, the connect policy, and JSON round-tripping.

use patchcord_core::codec;
use patchcord_core::patch::{Patch, PatchError, SignalTypePolicy};
use patchcord_core::types::{PortId, Position, SignalType};

fn origin() -> Position {
    Position::new(0.0, 0.0)
}

// ─── Node operations ─────────────────────────────────────────────────────────

#[test]
fn add_node_unknown_type_fails_and_leaves_graph_unchanged() {
    let mut patch = Patch::new();
    let err = patch.add_node("theremin", origin()).unwrap_err();
    assert_eq!(
        err,
        PatchError::UnknownModuleType {
            module_type: "theremin".to_string()
        }
    );
    assert!(patch.nodes().is_empty());
}

#[test]
fn add_node_seeds_default_params() {
    let mut patch = Patch::new();
    let id = patch.add_node("oscillator", origin()).unwrap();

    let node = patch.node(&id).unwrap();
    assert_eq!(node.params.get("tune"), Some(&440.0));
    assert_eq!(node.params.get("shape"), Some(&0.5));
    assert_eq!(node.params.get("fm"), Some(&0.0));
}

#[test]
fn add_node_generates_unique_ids() {
    let mut patch = Patch::new();
    let a = patch.add_node("noise", origin()).unwrap();
    let b = patch.add_node("noise", origin()).unwrap();
    assert_ne!(a, b);
    assert!(a.starts_with("noise_"));
}

#[test]
fn remove_node_drops_touching_connections() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();
    let vca = patch.add_node("vca", origin()).unwrap();

    patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    patch
        .connect(PortId::new(&vcf, "vcf_out"), PortId::new(&vca, "audio_in"))
        .unwrap();
    assert_eq!(patch.connections().len(), 2);

    patch.remove_node(&vcf).unwrap();
    assert_eq!(patch.connections().len(), 0);
    assert_eq!(patch.nodes().len(), 2);
}

#[test]
fn remove_unknown_node_fails() {
    let mut patch = Patch::new();
    assert!(matches!(
        patch.remove_node("ghost"),
        Err(PatchError::UnknownNode { .. })
    ));
}

// ─── Connections ─────────────────────────────────────────────────────────────

#[test]
fn connect_copies_signal_type_from_source() {
    let mut patch = Patch::new();
    let lfo = patch.add_node("lfo", origin()).unwrap();
    let osc = patch.add_node("oscillator", origin()).unwrap();

    patch
        .connect(PortId::new(&lfo, "lfo_out"), PortId::new(&osc, "v_oct"))
        .unwrap();
    assert_eq!(patch.connections()[0].signal_type, SignalType::Cv);
}

#[test]
fn connect_missing_node_or_port_is_invalid() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();

    assert!(matches!(
        patch.connect(
            PortId::new("ghost", "sine_out"),
            PortId::new(&vcf, "audio_in")
        ),
        Err(PatchError::InvalidEndpoint { .. })
    ));
    assert!(matches!(
        patch.connect(
            PortId::new(&osc, "saw_out"),
            PortId::new(&vcf, "audio_in")
        ),
        Err(PatchError::InvalidEndpoint { .. })
    ));
    assert!(patch.connections().is_empty());
}

#[test]
fn connect_direction_mismatch_is_invalid() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();

    // output -> output
    assert!(matches!(
        patch.connect(
            PortId::new(&osc, "sine_out"),
            PortId::new(&vcf, "vcf_out")
        ),
        Err(PatchError::InvalidEndpoint { .. })
    ));
    // input used as a source
    assert!(matches!(
        patch.connect(
            PortId::new(&vcf, "audio_in"),
            PortId::new(&osc, "v_oct")
        ),
        Err(PatchError::InvalidEndpoint { .. })
    ));
}

#[test]
fn connect_duplicate_returns_existing_id() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();

    let first = patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    let second = patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    assert_eq!(first, second);
    assert_eq!(patch.connections().len(), 1);
}

#[test]
fn feedback_loops_are_structurally_permitted() {
    let mut patch = Patch::new();
    let vcf = patch.add_node("filter", origin()).unwrap();
    let vca = patch.add_node("vca", origin()).unwrap();

    patch
        .connect(PortId::new(&vcf, "vcf_out"), PortId::new(&vca, "audio_in"))
        .unwrap();
    // Back edge closing the loop.
    patch
        .connect(PortId::new(&vca, "vca_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    assert_eq!(patch.connections().len(), 2);
}

#[test]
fn disconnect_removes_only_the_named_cable() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();

    patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    patch
        .connect(PortId::new(&osc, "pulse_out"), PortId::new(&vcf, "cv_in"))
        .unwrap();

    let removed = patch.disconnect(&PortId::new(&osc, "sine_out"), &PortId::new(&vcf, "audio_in"));
    assert!(removed.is_some());
    assert_eq!(patch.connections().len(), 1);

    let again = patch.disconnect(&PortId::new(&osc, "sine_out"), &PortId::new(&vcf, "audio_in"));
    assert!(again.is_none());
}

#[test]
fn permissive_policy_ignores_destination_signal_type() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();

    // Audio source into a CV input: allowed, type copied from the source.
    patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "cv_in"))
        .unwrap();
    assert_eq!(patch.connections()[0].signal_type, SignalType::Audio);
}

#[test]
fn enforced_policy_rejects_mismatched_signal_types() {
    let mut patch = Patch::with_policy(SignalTypePolicy::Enforced);
    let osc = patch.add_node("oscillator", origin()).unwrap();
    let vcf = patch.add_node("filter", origin()).unwrap();

    assert_eq!(
        patch
            .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "cv_in"))
            .unwrap_err(),
        PatchError::SignalTypeMismatch {
            from: SignalType::Audio,
            to: SignalType::Cv,
        }
    );

    // Matching types still connect.
    patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    assert_eq!(patch.connections().len(), 1);
}

// ─── Parameters ──────────────────────────────────────────────────────────────

#[test]
fn set_param_clamps_into_range() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();

    // Above max.
    assert_eq!(patch.set_param(&osc, "tune", 99999.0).unwrap(), 10000.0);
    assert_eq!(patch.param(&osc, "tune"), Some(10000.0));

    // Below min.
    assert_eq!(patch.set_param(&osc, "tune", -5.0).unwrap(), 20.0);

    // In range passes through untouched.
    assert_eq!(patch.set_param(&osc, "tune", 432.5).unwrap(), 432.5);
}

#[test]
fn set_param_snaps_stepped_params() {
    let mut patch = Patch::new();
    let lfo = patch.add_node("lfo", origin()).unwrap();

    assert_eq!(patch.set_param(&lfo, "shape", 2.4).unwrap(), 2.0);
    assert_eq!(patch.set_param(&lfo, "shape", 2.6).unwrap(), 3.0);
    assert_eq!(patch.set_param(&lfo, "shape", 9.0).unwrap(), 4.0);
}

#[test]
fn set_param_unknown_ids_fail() {
    let mut patch = Patch::new();
    let osc = patch.add_node("oscillator", origin()).unwrap();

    assert!(matches!(
        patch.set_param("ghost", "tune", 100.0),
        Err(PatchError::UnknownNode { .. })
    ));
    assert!(matches!(
        patch.set_param(&osc, "cutoff", 100.0),
        Err(PatchError::UnknownParam { .. })
    ));
}

// ─── Serialization round-trip ────────────────────────────────────────────────

#[test]
fn roundtrip_preserves_nodes_connections_and_params() {
    let mut patch = Patch::new();
    patch.set_name("Round Trip");
    let osc = patch.add_node("oscillator", Position::new(80.0, 120.0)).unwrap();
    let vcf = patch.add_node("filter", Position::new(340.0, 120.0)).unwrap();
    let vca = patch.add_node("vca", Position::new(580.0, 120.0)).unwrap();

    patch.set_param(&osc, "tune", 220.0).unwrap();
    patch.set_param(&vcf, "resonance", 0.25).unwrap();

    patch
        .connect(PortId::new(&osc, "sine_out"), PortId::new(&vcf, "audio_in"))
        .unwrap();
    patch
        .connect(PortId::new(&vcf, "vcf_out"), PortId::new(&vca, "audio_in"))
        .unwrap();

    let json = codec::export_json(&patch);
    let restored = codec::import_json(&json).unwrap();

    let original = patch.to_state();
    let roundtripped = restored.to_state();

    assert_eq!(roundtripped.name, "Round Trip");
    // Node order is preserved exactly.
    assert_eq!(
        roundtripped.nodes.iter().map(|n| &n.id).collect::<Vec<_>>(),
        vec![&osc, &vcf, &vca]
    );
    assert_eq!(roundtripped, original);
}

#[test]
fn import_clamps_out_of_range_params() {
    let json = r#"{
        "version": 1,
        "name": "Hot",
        "nodes": [
            { "id": "osc", "type": "oscillator",
              "position": { "x": 0.0, "y": 0.0 },
              "params": { "tune": 99999.0 } }
        ],
        "connections": []
    }"#;
    let patch = codec::import_json(json).unwrap();
    assert_eq!(patch.param("osc", "tune"), Some(10000.0));
}

#[test]
fn import_rejects_unknown_param_ids() {
    let json = r#"{
        "version": 1,
        "name": "Bad",
        "nodes": [
            { "id": "osc", "type": "oscillator",
              "position": { "x": 0.0, "y": 0.0 },
              "params": { "cutoff": 440.0 } }
        ],
        "connections": []
    }"#;
    assert!(matches!(
        codec::import_json(json),
        Err(PatchError::UnknownParam { .. })
    ));
}

#[test]
fn import_rejects_dangling_connections() {
    let json = r#"{
        "version": 1,
        "name": "Dangling",
        "nodes": [
            { "id": "osc", "type": "oscillator",
              "position": { "x": 0.0, "y": 0.0 }, "params": {} }
        ],
        "connections": [
            { "id": "c", "from": { "moduleId": "osc", "portId": "sine_out" },
              "to": { "moduleId": "ghost", "portId": "audio_in" },
              "signalType": "audio" }
        ]
    }"#;
    assert!(matches!(
        codec::import_json(json),
        Err(PatchError::InvalidEndpoint { .. })
    ));
}

#[test]
fn import_rejects_duplicate_node_ids() {
    let json = r#"{
        "version": 1,
        "name": "Dup",
        "nodes": [
            { "id": "n", "type": "noise",
              "position": { "x": 0.0, "y": 0.0 }, "params": {} },
            { "id": "n", "type": "noise",
              "position": { "x": 10.0, "y": 0.0 }, "params": {} }
        ],
        "connections": []
    }"#;
    assert!(matches!(
        codec::import_json(json),
        Err(PatchError::MalformedPatch { .. })
    ));
}

#[test]
fn import_rejects_unknown_module_types() {
    let json = r#"{
        "version": 1,
        "name": "Unknown",
        "nodes": [
            { "id": "x", "type": "theremin",
              "position": { "x": 0.0, "y": 0.0 }, "params": {} }
        ],
        "connections": []
    }"#;
    // The closed kind set fails at parse time.
    assert!(matches!(
        codec::import_json(json),
        Err(PatchError::MalformedPatch { .. })
    ));
}

#[test]
fn failed_import_leaves_existing_patch_untouched() {
    let mut patch = Patch::new();
    patch.add_node("noise", origin()).unwrap();

    let result = codec::import_json("{ definitely not a patch");
    assert!(result.is_err());
    assert_eq!(patch.nodes().len(), 1);
}
