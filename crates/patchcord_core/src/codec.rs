//! Patch serialization: the JSON wire format exchanged with the editor and
//! persistence layers, and the init patch used as a fallback.

use crate::patch::{Patch, PatchError};
use crate::types::{Connection, NodeState, PatchState, PortId, Position, SignalType};

/// Serialize a patch to pretty-printed JSON.
pub fn export_json(patch: &Patch) -> String {
    // PatchState contains only plain data; serialization cannot fail.
    serde_json::to_string_pretty(&patch.to_state()).unwrap_or_default()
}

/// Parse and validate a JSON patch. Fails cleanly on malformed input; the
/// caller's in-memory graph is never touched.
pub fn import_json(json: &str) -> Result<Patch, PatchError> {
    let state: PatchState =
        serde_json::from_str(json).map_err(|e| PatchError::MalformedPatch {
            message: e.to_string(),
        })?;
    Patch::from_state(state)
}

/// Default patch: VCO -> VCF -> VCA -> Output, with the envelope driving the
/// VCA's CV input. Makes sound as soon as a gate arrives.
pub fn default_patch() -> Patch {
    fn node(id: &str, kind: crate::types::ModuleKind, x: f64, y: f64, params: &[(&str, f64)]) -> NodeState {
        NodeState {
            id: id.to_string(),
            kind,
            position: Position::new(x, y),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }

    fn cable(from: (&str, &str), to: (&str, &str), signal_type: SignalType) -> Connection {
        Connection {
            id: format!("{}.{}->{}.{}", from.0, from.1, to.0, to.1),
            from: PortId::new(from.0, from.1),
            to: PortId::new(to.0, to.1),
            signal_type,
        }
    }

    use crate::types::ModuleKind::*;

    let state = PatchState {
        version: crate::patch::PATCH_VERSION,
        name: "Init Patch".to_string(),
        nodes: vec![
            node(
                "oscillator_1",
                Oscillator,
                80.0,
                120.0,
                &[("tune", 220.0), ("shape", 0.5), ("fm", 0.0)],
            ),
            node(
                "filter_1",
                Filter,
                340.0,
                120.0,
                &[("cutoff", 2000.0), ("resonance", 0.2), ("cv_amount", 0.5)],
            ),
            node("vca_1", Vca, 580.0, 120.0, &[("gain", 0.0)]),
            node(
                "envelope_1",
                Envelope,
                340.0,
                340.0,
                &[
                    ("attack", 0.01),
                    ("decay", 0.2),
                    ("sustain", 0.6),
                    ("release", 0.4),
                ],
            ),
            node("output_1", Output, 800.0, 120.0, &[("volume", 0.5)]),
        ],
        connections: vec![
            cable(
                ("oscillator_1", "sine_out"),
                ("filter_1", "audio_in"),
                SignalType::Audio,
            ),
            cable(
                ("filter_1", "vcf_out"),
                ("vca_1", "audio_in"),
                SignalType::Audio,
            ),
            cable(
                ("vca_1", "vca_out"),
                ("output_1", "audio_in"),
                SignalType::Audio,
            ),
            cable(
                ("envelope_1", "env_out"),
                ("vca_1", "cv_in"),
                SignalType::Cv,
            ),
        ],
    };

    Patch::from_state(state).expect("init patch validates against the catalog")
}
