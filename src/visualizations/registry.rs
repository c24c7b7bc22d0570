//! Visualization registry and active-index switcher.

use thiserror::Error;

use super::{SynthContext, Visualization, VisualizationKind};

/// Errors building the visualization registry.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No visualizations available")]
    Empty,

    #[error("Unknown visualization '{0}'")]
    UnknownVisualization(String),
}

/// Instantiate visualizations in registry order, or in the order of `keys`.
pub fn build_registry(
    keys: Option<&[String]>,
) -> Result<Vec<Box<dyn Visualization>>, RegistryError> {
    let kinds = match keys {
        None => VisualizationKind::all().to_vec(),
        Some(keys) => keys
            .iter()
            .map(|key| {
                VisualizationKind::from_str(key)
                    .ok_or_else(|| RegistryError::UnknownVisualization(key.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?,
    };

    if kinds.is_empty() {
        return Err(RegistryError::Empty);
    }
    Ok(kinds.iter().map(VisualizationKind::create).collect())
}

struct Slot {
    visualization: Box<dyn Visualization>,
    ready: bool,
}

/// Ordered visualizations with exactly one active.
///
/// `setup` runs once per instance, the first time it becomes active. No
/// hook runs when a visualization is switched away from.
pub struct Switcher {
    slots: Vec<Slot>,
    index: usize,
    context: SynthContext,
}

impl Switcher {
    /// Take ownership of the registry and activate the first entry.
    pub fn new(
        visualizations: Vec<Box<dyn Visualization>>,
        context: SynthContext,
    ) -> Result<Self, RegistryError> {
        if visualizations.is_empty() {
            return Err(RegistryError::Empty);
        }
        let slots = visualizations
            .into_iter()
            .map(|visualization| Slot {
                visualization,
                ready: false,
            })
            .collect();

        let mut switcher = Self {
            slots,
            index: 0,
            context,
        };
        switcher.activate();
        Ok(switcher)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; construction rejects empty registries.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Index of the active visualization.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> &dyn Visualization {
        self.slots[self.index].visualization.as_ref()
    }

    pub fn current_mut(&mut self) -> &mut dyn Visualization {
        self.slots[self.index].visualization.as_mut()
    }

    /// Advance with wraparound.
    pub fn next(&mut self) {
        self.select(self.index + 1);
    }

    /// Step back with wraparound.
    pub fn previous(&mut self) {
        self.select(self.index + self.slots.len() - 1);
    }

    /// Activate `index` (taken modulo the registry length).
    pub fn select(&mut self, index: usize) {
        self.index = index % self.slots.len();
        self.activate();
    }

    /// Activate the visualization registered under `key` (or one of its
    /// aliases).
    pub fn select_key(&mut self, key: &str) -> Result<(), RegistryError> {
        let unknown = || RegistryError::UnknownVisualization(key.to_string());
        let name = VisualizationKind::from_str(key).ok_or_else(unknown)?.name();
        let index = self
            .slots
            .iter()
            .position(|s| s.visualization.name() == name)
            .ok_or_else(unknown)?;
        self.select(index);
        Ok(())
    }

    /// Names in registry order.
    pub fn names(&self) -> Vec<&str> {
        self.slots.iter().map(|s| s.visualization.name()).collect()
    }

    pub fn context(&self) -> &SynthContext {
        &self.context
    }

    fn activate(&mut self) {
        let slot = &mut self.slots[self.index];
        log::info!("Switched to visualization: {}", slot.visualization.name());
        if slot.ready {
            return;
        }
        if let Err(e) = slot.visualization.setup(&self.context) {
            log::warn!("Setup failed for {}: {e}", slot.visualization.name());
        }
        slot.ready = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visualizations::{Canvas, VisualizationError};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Probe {
        name: String,
        setups: Arc<AtomicUsize>,
    }

    impl Visualization for Probe {
        fn name(&self) -> &str {
            &self.name
        }

        fn setup(&mut self, _ctx: &SynthContext) -> Result<(), VisualizationError> {
            self.setups.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn update(&mut self, _dt: f32) -> Result<(), VisualizationError> {
            Ok(())
        }

        fn draw(&mut self, _canvas: &mut Canvas) -> Result<bool, VisualizationError> {
            Ok(true)
        }
    }

    fn probes(n: usize) -> (Vec<Box<dyn Visualization>>, Vec<Arc<AtomicUsize>>) {
        let counters: Vec<_> = (0..n).map(|_| Arc::new(AtomicUsize::new(0))).collect();
        let visualizations = counters
            .iter()
            .enumerate()
            .map(|(i, setups)| {
                Box::new(Probe {
                    name: format!("probe-{i}"),
                    setups: Arc::clone(setups),
                }) as Box<dyn Visualization>
            })
            .collect();
        (visualizations, counters)
    }

    #[test]
    fn test_empty_registry_rejected() {
        let result = Switcher::new(Vec::new(), SynthContext::new(64, 64));
        assert!(matches!(result, Err(RegistryError::Empty)));
    }

    #[test]
    fn test_first_entry_set_up_on_creation() {
        let (visualizations, counters) = probes(2);
        let switcher = Switcher::new(visualizations, SynthContext::new(64, 64)).unwrap();
        assert_eq!(switcher.index(), 0);
        assert_eq!(counters[0].load(Ordering::SeqCst), 1);
        assert_eq!(counters[1].load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_setup_runs_once_per_instance() {
        let (visualizations, counters) = probes(3);
        let mut switcher = Switcher::new(visualizations, SynthContext::new(64, 64)).unwrap();
        for _ in 0..7 {
            switcher.next();
        }
        for _ in 0..5 {
            switcher.previous();
        }
        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_select_wraps() {
        let (visualizations, _) = probes(3);
        let mut switcher = Switcher::new(visualizations, SynthContext::new(64, 64)).unwrap();
        switcher.select(4);
        assert_eq!(switcher.index(), 1);
        assert_eq!(switcher.current().name(), "probe-1");
    }

    #[test]
    fn test_build_registry_default_order() {
        let registry = build_registry(None).unwrap();
        let names: Vec<_> = registry.iter().map(|v| v.name().to_string()).collect();
        let expected: Vec<_> = VisualizationKind::all()
            .iter()
            .map(|k| k.name().to_string())
            .collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_build_registry_from_keys() {
        let keys = vec!["6_a_life".to_string(), "sine".to_string()];
        let registry = build_registry(Some(keys.as_slice())).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry[0].name(), "A-Life Simulation");
        assert_eq!(registry[1].name(), "Sine Wave");
    }

    #[test]
    fn test_build_registry_errors() {
        let empty: Vec<String> = Vec::new();
        assert_eq!(
            build_registry(Some(empty.as_slice())).err(),
            Some(RegistryError::Empty)
        );
        let keys = vec!["plasma".to_string()];
        assert_eq!(
            build_registry(Some(keys.as_slice())).err(),
            Some(RegistryError::UnknownVisualization("plasma".into()))
        );
    }
}
