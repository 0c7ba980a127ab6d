//! In-memory join of bindings with their owning instances.

use std::collections::HashMap;

use havoc_core::{BoundApp, ServiceBinding, ServiceInstance};

/// Join `bindings` against `instances` (keyed by instance id), keeping only
/// live units. Output follows binding order.
pub fn join_bound_applications(
    instances: &HashMap<String, ServiceInstance>,
    bindings: &[ServiceBinding],
) -> Vec<BoundApp> {
    bindings
        .iter()
        .filter_map(|binding| {
            let instance = instances.get(&binding.service_instance_id)?;
            if binding.app_id.is_empty() || instance.probability == 0.0 || instance.frequency == 0 {
                return None;
            }
            Some(BoundApp {
                app_id: binding.app_id.clone(),
                probability: instance.probability,
                frequency: instance.frequency,
                last_processed: binding.last_processed.clone(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(id: &str, probability: f64, frequency: i32) -> ServiceInstance {
        ServiceInstance {
            id: id.to_string(),
            dashboard_url: String::new(),
            plan_id: "default".to_string(),
            probability,
            frequency,
        }
    }

    fn binding(id: &str, app_id: &str, instance_id: &str) -> ServiceBinding {
        ServiceBinding {
            id: id.to_string(),
            app_id: app_id.to_string(),
            service_plan_id: "default".to_string(),
            service_instance_id: instance_id.to_string(),
            last_processed: None,
        }
    }

    fn index(instances: Vec<ServiceInstance>) -> HashMap<String, ServiceInstance> {
        instances.into_iter().map(|i| (i.id.clone(), i)).collect()
    }

    #[test]
    fn keeps_live_units_and_drops_zero_probability() {
        let instances = index(vec![
            instance("I1", 0.2, 5),
            instance("I2", 0.4, 10),
            instance("I3", 0.0, 10),
        ]);
        let bindings = vec![
            binding("B1", "A1", "I1"),
            binding("B2", "A2", "I2"),
            binding("B3", "A3", "I3"),
        ];

        let units = join_bound_applications(&instances, &bindings);

        let ids: Vec<&str> = units.iter().map(|u| u.app_id.as_str()).collect();
        assert_eq!(ids, vec!["A1", "A2"]);
        assert_eq!(units[1].probability, 0.4);
        assert_eq!(units[1].frequency, 10);
    }

    #[test]
    fn drops_orphans_empty_app_and_zero_frequency() {
        let instances = index(vec![instance("I1", 0.5, 5), instance("I2", 0.5, 0)]);
        let bindings = vec![
            binding("B1", "A1", "missing"),
            binding("B2", "", "I1"),
            binding("B3", "A3", "I2"),
            binding("B4", "A4", "I1"),
        ];

        let units = join_bound_applications(&instances, &bindings);

        assert_eq!(units.len(), 1);
        assert_eq!(units[0].app_id, "A4");
    }

    #[test]
    fn carries_last_processed_from_binding() {
        let instances = index(vec![instance("I1", 1.0, 1)]);
        let mut b = binding("B1", "A1", "I1");
        b.last_processed = Some("2024-01-01T00:00:00Z".to_string());

        let units = join_bound_applications(&instances, &[b]);

        assert_eq!(units[0].last_processed.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn dormant_instance_yields_nothing() {
        let instances = index(vec![instance("I1", 0.5, 5)]);
        assert!(join_bound_applications(&instances, &[]).is_empty());
    }

    #[test]
    fn multiple_bindings_share_instance_parameters() {
        let instances = index(vec![instance("I1", 0.3, 7)]);
        let bindings = vec![binding("B1", "A1", "I1"), binding("B2", "A2", "I1")];

        let units = join_bound_applications(&instances, &bindings);

        assert_eq!(units.len(), 2);
        assert!(units.iter().all(|u| u.probability == 0.3 && u.frequency == 7));
    }
}
