// Default campus catalog, seeded into an empty service directory

use crate::domain::{Gender, Service, ServiceStatus, ServiceType};

fn service(
    id: &str,
    name: &str,
    service_type: ServiceType,
    status: ServiceStatus,
    icon_name: &str,
    description: &str,
    gender: Option<Gender>,
) -> Service {
    Service {
        id: id.to_string(),
        name: name.to_string(),
        service_type,
        status,
        icon_name: icon_name.to_string(),
        description: description.to_string(),
        gender,
    }
}

pub fn default_catalog() -> Vec<Service> {
    use ServiceStatus::{Closed, Open};
    use ServiceType::{Appointment, Queue};

    vec![
        service(
            "mens-mess-1",
            "Men's Mess 1",
            Queue,
            Open,
            "Utensils",
            "Join the queue for the main men's mess.",
            Some(Gender::Male),
        ),
        service(
            "womens-mess-1",
            "Women's Mess 1",
            Queue,
            Open,
            "Utensils",
            "Queue up for the main women's mess.",
            Some(Gender::Female),
        ),
        service(
            "main-gym",
            "Main Gym",
            Queue,
            Closed,
            "Dumbbell",
            "Check gym occupancy and join the waitlist.",
            Some(Gender::All),
        ),
        service(
            "hod-cse",
            "HOD - CSE Dept.",
            Appointment,
            Open,
            "BookUser",
            "Book an appointment with the Head of Department.",
            None,
        ),
        service(
            "proctor-jane",
            "Proctor - Jane Doe",
            Appointment,
            Open,
            "Users",
            "Schedule a meeting with your proctor.",
            None,
        ),
        service(
            "admin-office",
            "Admin Office",
            Appointment,
            Closed,
            "Building",
            "Book a slot for administrative services.",
            None,
        ),
        service(
            "out-pass-gate-1",
            "Out-Pass Gate 1",
            Queue,
            Open,
            "Ticket",
            "Join the queue for out-pass verification.",
            Some(Gender::All),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_are_unique_and_valid() {
        let catalog = default_catalog();
        let mut ids: Vec<&str> = catalog.iter().map(|s| s.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());

        for s in &catalog {
            assert!(crate::application::queue_engine::validate::validate_service_id(&s.id).is_ok());
        }
    }

    #[test]
    fn test_catalog_mix() {
        let catalog = default_catalog();
        let open_queues = catalog.iter().filter(|s| s.accepts_joins()).count();
        assert_eq!(open_queues, 3);
    }
}
