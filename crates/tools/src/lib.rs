//! Scripted sessions against the view/history synchronization.
//!
//! A script is a JSON document:
//!
//! ```json
//! {
//!   "fragment": "#map=12/680000/630000/1",
//!   "steps": [{"pan": [700000, 640000]}, {"basemap": 0}, "back", "forward", "home"]
//! }
//! ```

use std::fs;
use std::path::Path;

use formats::ViewerManifest;
use permalink::{
    HistorySync, InMemoryHistory, SimulatedMap, Startup, Transition, ViewState,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Pan([f64; 2]),
    PanBy([f64; 2]),
    Zoom(f64),
    Basemap(usize),
    Home,
    Back,
    Forward,
    /// The user types a fragment into the address bar.
    Hash(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: Step,
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplayReport {
    pub startup: Startup,
    pub steps: Vec<StepReport>,
    pub final_state: ViewState,
    /// Fragments of all session entries, page-load entry first.
    pub entries: Vec<Option<String>>,
    pub cursor: usize,
}

impl ReplayReport {
    pub fn push_count(&self) -> usize {
        self.steps
            .iter()
            .flat_map(|s| s.transitions.iter())
            .filter(|t| matches!(t, Transition::Pushed(_)))
            .count()
    }
}

pub fn load_manifest(path: Option<&Path>) -> Result<ViewerManifest, String> {
    let Some(path) = path else {
        return Ok(ViewerManifest::ngi_belgium());
    };
    let raw = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    ViewerManifest::from_json(&raw).map_err(|e| format!("{path:?}: {e}"))
}

pub fn load_script(path: &Path) -> Result<Script, String> {
    let raw = fs::read_to_string(path).map_err(|e| format!("read {path:?}: {e}"))?;
    serde_json::from_str(&raw).map_err(|e| format!("parse {path:?}: {e}"))
}

pub fn replay(manifest: &ViewerManifest, script: &Script) -> Result<ReplayReport, String> {
    let basemaps = manifest.build_basemaps().map_err(|e| e.to_string())?;
    let host = SimulatedMap::new(
        basemaps,
        manifest.zoom_range(),
        manifest.max_resolution,
        manifest.home_extent(),
    );
    let history = match &script.fragment {
        Some(f) => InMemoryHistory::with_fragment(f.clone()),
        None => InMemoryHistory::new(),
    };

    let (mut sync, startup) =
        HistorySync::start(host, history, manifest.default_view_state()).map_err(|e| e.to_string())?;

    let mut steps = Vec::with_capacity(script.steps.len());
    for step in &script.steps {
        let transitions = run_step(&mut sync, step)?;
        debug!(?step, count = transitions.len(), "step done");
        steps.push(StepReport {
            step: step.clone(),
            transitions,
        });
    }

    let final_state = sync.current_view_state().map_err(|e| e.to_string())?;
    let history = sync.history();
    let entries = history
        .fragments()
        .into_iter()
        .map(|f| f.map(str::to_string))
        .collect();
    let cursor = history.cursor();

    Ok(ReplayReport {
        startup,
        steps,
        final_state,
        entries,
        cursor,
    })
}

fn run_step(
    sync: &mut HistorySync<SimulatedMap, InMemoryHistory>,
    step: &Step,
) -> Result<Vec<Transition>, String> {
    let navigation = match step {
        Step::Pan(c) => {
            sync.host_mut().pan_to(*c);
            None
        }
        Step::PanBy([dx, dy]) => {
            sync.host_mut().pan_by(*dx, *dy);
            None
        }
        Step::Zoom(z) => {
            sync.host_mut().zoom_to(*z);
            None
        }
        Step::Basemap(i) => {
            sync.host_mut()
                .select_basemap(*i)
                .map_err(|e| e.to_string())?;
            None
        }
        Step::Home => {
            sync.host_mut().zoom_to_home();
            None
        }
        Step::Back => sync.history_mut().back(),
        Step::Forward => sync.history_mut().forward(),
        Step::Hash(f) => Some(sync.history_mut().navigate_to_fragment(f.clone())),
    };

    let mut out = Vec::new();
    if let Some(n) = navigation {
        out.push(sync.dispatch(n).map_err(|e| e.to_string())?);
    }
    out.extend(sync.pump());
    Ok(out)
}

pub fn describe(t: &Transition) -> String {
    match t {
        Transition::Pushed(e) => format!("push {}", e.hash),
        Transition::Swallowed => "swallowed restore echo".to_string(),
        Transition::Restored(s) => format!(
            "restore zoom={} center=[{}, {}]",
            s.zoom, s.center[0], s.center[1]
        ),
        Transition::Ignored => "ignored stateless entry".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{Script, Step, describe, replay};
    use formats::ViewerManifest;
    use permalink::{StartupSource, Transition, ViewState};
    use pretty_assertions::assert_eq;

    fn run(script: &str) -> super::ReplayReport {
        let script: Script = serde_json::from_str(script).unwrap();
        replay(&ViewerManifest::ngi_belgium(), &script).unwrap()
    }

    #[test]
    fn script_json_shape() {
        let s: Script = serde_json::from_str(
            r##"{"steps": [{"pan": [1, 2]}, {"pan_by": [3, 4]}, {"zoom": 5.5}, {"basemap": 1}, "home", "back", "forward", {"hash": "#map=1/2/3/0"}]}"##,
        )
        .unwrap();
        assert_eq!(s.fragment, None);
        assert_eq!(
            s.steps,
            vec![
                Step::Pan([1.0, 2.0]),
                Step::PanBy([3.0, 4.0]),
                Step::Zoom(5.5),
                Step::Basemap(1),
                Step::Home,
                Step::Back,
                Step::Forward,
                Step::Hash("#map=1/2/3/0".to_string()),
            ]
        );
    }

    #[test]
    fn pan_then_back_restores_without_extra_entries() {
        let report = run(r#"{"steps": [{"pan": [700000, 640000]}, {"zoom": 12}, "back"]}"#);
        assert_eq!(report.push_count(), 2);
        assert_eq!(
            report.entries,
            vec![
                None,
                Some("#map=9/700000/640000/2".to_string()),
                Some("#map=12/700000/640000/2".to_string()),
            ]
        );
        assert_eq!(report.cursor, 1);
        assert_eq!(
            report.steps[2].transitions.last(),
            Some(&Transition::Swallowed)
        );
        assert_eq!(
            report.final_state,
            ViewState::new(9.0, [700000.0, 640000.0], 2)
        );
    }

    #[test]
    fn startup_fragment_is_honoured() {
        let report = run(r##"{"fragment": "#map=12/680000/630000/1", "steps": []}"##);
        assert_eq!(report.startup.source, StartupSource::Fragment);
        assert_eq!(report.push_count(), 0);
        assert_eq!(
            report.final_state,
            ViewState::new(12.0, [680000.0, 630000.0], 1)
        );
    }

    #[test]
    fn typed_hash_does_not_move_the_map() {
        let report = run(r##"{"steps": [{"hash": "#map=3/0/0/0"}]}"##);
        assert_eq!(report.steps[0].transitions, vec![Transition::Ignored]);
        assert_eq!(
            report.final_state,
            ViewState::new(9.0, [675000.0, 625000.0], 2)
        );
    }

    #[test]
    fn home_pushes_fractional_zoom_rounded() {
        let report = run(r#"{"steps": ["home"]}"#);
        let Transition::Pushed(entry) = &report.steps[0].transitions[0] else {
            panic!("expected a push");
        };
        assert!(entry.hash.starts_with("#map="));
        assert_ne!(entry.state.zoom.fract(), 0.0);
    }

    #[test]
    fn bad_basemap_step_is_an_error() {
        let script: Script = serde_json::from_str(r#"{"steps": [{"basemap": 7}]}"#).unwrap();
        assert!(replay(&ViewerManifest::ngi_belgium(), &script).is_err());
    }

    #[test]
    fn describes_transitions() {
        assert_eq!(describe(&Transition::Ignored), "ignored stateless entry");
        assert_eq!(describe(&Transition::Swallowed), "swallowed restore echo");
    }
}
