//! Demo reference data for running without a database.

use chrono::Utc;

use carkeeper_catalog::{Brand, CarModel, DriveType, EngineType, Generation, Transmission, Trim};
use carkeeper_configurator::{Color, EquipmentOption};
use carkeeper_core::{
    BranchId, BrandId, ColorId, DriveTypeId, EngineTypeId, GenerationId, ModelId, Money, OptionId, ServiceTypeId,
    TransmissionId, TrimId,
};
use carkeeper_servicing::{Branch, ServiceType};

use crate::InMemoryStore;

/// Ids of the seeded rows.
#[derive(Debug, Clone)]
pub struct DemoCatalog {
    pub brand_id: BrandId,
    pub model_id: ModelId,
    pub generation_id: GenerationId,
    /// Available trim priced at 30000.
    pub trim_id: TrimId,
    /// Available color with a +500 delta.
    pub color_id: ColorId,
    /// Options priced 1000 and 200, both offered on `trim_id`.
    pub option_ids: Vec<OptionId>,
    pub branch_id: BranchId,
    pub inactive_branch_id: BranchId,
    pub service_type_ids: Vec<ServiceTypeId>,
}

pub fn seed(store: &InMemoryStore) -> DemoCatalog {
    let now = Utc::now();

    let brand_id = BrandId::new();
    store.add_brand(Brand {
        brand_id,
        name: "Toyota".into(),
        country: "Japan".into(),
        created_at: now,
    });

    let model_id = ModelId::new();
    store.add_model(CarModel {
        model_id,
        brand_id,
        name: "Camry".into(),
        segment: Some("D".into()),
        description: None,
        created_at: now,
    });

    let generation_id = GenerationId::new();
    store.add_generation(Generation {
        generation_id,
        model_id,
        name: "XV70".into(),
        year_from: 2017,
        year_to: None,
        created_at: now,
    });

    let engine_type_id = EngineTypeId::new();
    store.add_engine_type(EngineType {
        engine_type_id,
        name: "Petrol".into(),
        created_at: now,
    });
    let transmission_id = TransmissionId::new();
    store.add_transmission(Transmission {
        transmission_id,
        name: "Automatic".into(),
        created_at: now,
    });
    let drive_type_id = DriveTypeId::new();
    store.add_drive_type(DriveType {
        drive_type_id,
        name: "FWD".into(),
        created_at: now,
    });

    let trim_id = TrimId::new();
    store.add_trim(Trim {
        trim_id,
        generation_id,
        name: "Comfort".into(),
        base_price: Money::new(30_000),
        engine_type_id,
        transmission_id,
        drive_type_id,
        is_available: true,
        created_at: now,
        updated_at: now,
    });

    let color_id = ColorId::new();
    store.add_color(Color {
        color_id,
        name: "Pearl White".into(),
        hex_code: Some("#F8F8F0".into()),
        price_delta: Money::new(500),
        is_available: true,
        created_at: now,
    });

    let option_ids: Vec<OptionId> = [("Heated seats", 1_000), ("Floor mats", 200)]
        .into_iter()
        .map(|(name, price)| {
            let option_id = OptionId::new();
            store.add_option(
                EquipmentOption {
                    option_id,
                    name: name.into(),
                    description: None,
                    price: Money::new(price),
                    is_available: true,
                    created_at: now,
                },
                &[trim_id],
            );
            option_id
        })
        .collect();

    let branch = |name: &str, is_active| Branch {
        branch_id: BranchId::new(),
        name: name.into(),
        address: "1 Dealer Way".into(),
        phone: None,
        email: None,
        is_active,
        created_at: now,
        updated_at: now,
    };
    let active = branch("Central", true);
    let inactive = branch("Old Town", false);
    let (branch_id, inactive_branch_id) = (active.branch_id, inactive.branch_id);
    store.add_branch(active);
    store.add_branch(inactive);

    let service_type_ids: Vec<ServiceTypeId> = [("Oil change", "maintenance", 4_500), ("Diagnostics", "repair", 3_000)]
        .into_iter()
        .map(|(name, category, price)| {
            let service_type_id = ServiceTypeId::new();
            store.add_service_type(ServiceType {
                service_type_id,
                name: name.into(),
                category: category.into(),
                description: None,
                price: Money::new(price),
                duration_minutes: Some(60),
                is_available: true,
                created_at: now,
            });
            service_type_id
        })
        .collect();

    DemoCatalog {
        brand_id,
        model_id,
        generation_id,
        trim_id,
        color_id,
        option_ids,
        branch_id,
        inactive_branch_id,
        service_type_ids,
    }
}
