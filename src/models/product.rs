// src/models/product.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::Utc;

/// Vehicle the part fits. All fields optional; the dashboard sends empty
/// strings for untouched inputs, so blank values are normalized away.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct VehicleCompatibility {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: f64,
    #[serde(rename = "inStock", default = "default_in_stock")]
    pub in_stock: bool,
    pub category: String,
    #[serde(rename = "subCategory", default, skip_serializing_if = "Option::is_none")]
    pub sub_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(rename = "deliveryTime", default = "default_delivery_time")]
    pub delivery_time: u32,
    #[serde(rename = "affiliateLink", default, skip_serializing_if = "Option::is_none")]
    pub affiliate_link: Option<String>,
    #[serde(rename = "vehicleCompatibility", default)]
    pub vehicle_compatibility: VehicleCompatibility,
    #[serde(rename = "cityAvailability", default)]
    pub city_availability: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    /// Owning identity id. Always the authenticated caller, never trusted
    /// from the payload.
    pub user: String,
    #[serde(rename = "createdAt")]
    pub created_at: String,
    /// Set only by the client layer when an offline update is applied.
    #[serde(rename = "updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

fn default_in_stock() -> bool {
    true
}

fn default_delivery_time() -> u32 {
    3
}

/// Payload for POST /api/products. A `user` field supplied by the caller is
/// accepted syntactically and discarded: the owner is always the caller.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub images: Vec<String>,
    pub price: f64,
    #[serde(rename = "inStock", default = "default_in_stock")]
    pub in_stock: bool,
    pub category: String,
    #[serde(rename = "subCategory", default)]
    pub sub_category: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(rename = "deliveryTime", default = "default_delivery_time")]
    pub delivery_time: u32,
    #[serde(rename = "affiliateLink", default)]
    pub affiliate_link: Option<String>,
    #[serde(rename = "vehicleCompatibility", default)]
    pub vehicle_compatibility: VehicleCompatibility,
    #[serde(rename = "cityAvailability", default)]
    pub city_availability: Vec<String>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub user: Option<String>,
}

impl CreateProductRequest {
    pub fn into_record(self, owner_id: &str) -> ProductRecord {
        ProductRecord {
            id: Uuid::new_v4().to_string(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            images: self.images,
            price: self.price,
            in_stock: self.in_stock,
            category: self.category.trim().to_string(),
            sub_category: normalize(self.sub_category),
            brand: normalize(self.brand),
            delivery_time: self.delivery_time,
            affiliate_link: normalize(self.affiliate_link),
            vehicle_compatibility: VehicleCompatibility {
                brand: normalize(self.vehicle_compatibility.brand),
                model: normalize(self.vehicle_compatibility.model),
                year: normalize(self.vehicle_compatibility.year),
            },
            city_availability: self.city_availability,
            stock: self.stock,
            user: owner_id.to_string(),
            created_at: Utc::now().to_rfc3339(),
            updated_at: None,
        }
    }
}

/// Payload for PUT /api/products/{id}. Field-level merge: absent fields keep
/// their stored values.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub price: Option<f64>,
    #[serde(rename = "inStock")]
    pub in_stock: Option<bool>,
    pub category: Option<String>,
    #[serde(rename = "subCategory")]
    pub sub_category: Option<String>,
    pub brand: Option<String>,
    #[serde(rename = "deliveryTime")]
    pub delivery_time: Option<u32>,
    #[serde(rename = "affiliateLink")]
    pub affiliate_link: Option<String>,
    #[serde(rename = "vehicleCompatibility")]
    pub vehicle_compatibility: Option<VehicleCompatibility>,
    #[serde(rename = "cityAvailability")]
    pub city_availability: Option<Vec<String>>,
    pub stock: Option<u32>,
    #[serde(default)]
    pub user: Option<String>,
}

impl UpdateProductRequest {
    /// Apply the submitted fields to an existing record. Ownership and id are
    /// untouched regardless of the payload.
    pub fn apply_to(&self, record: &mut ProductRecord) {
        if let Some(name) = &self.name {
            record.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            record.description = description.trim().to_string();
        }
        if let Some(images) = &self.images {
            record.images = images.clone();
        }
        if let Some(price) = self.price {
            record.price = price;
        }
        if let Some(in_stock) = self.in_stock {
            record.in_stock = in_stock;
        }
        if let Some(category) = &self.category {
            record.category = category.trim().to_string();
        }
        if let Some(sub_category) = &self.sub_category {
            record.sub_category = normalize(Some(sub_category.clone()));
        }
        if let Some(brand) = &self.brand {
            record.brand = normalize(Some(brand.clone()));
        }
        if let Some(delivery_time) = self.delivery_time {
            record.delivery_time = delivery_time;
        }
        if let Some(affiliate_link) = &self.affiliate_link {
            record.affiliate_link = normalize(Some(affiliate_link.clone()));
        }
        if let Some(vc) = &self.vehicle_compatibility {
            record.vehicle_compatibility = VehicleCompatibility {
                brand: normalize(vc.brand.clone()),
                model: normalize(vc.model.clone()),
                year: normalize(vc.year.clone()),
            };
        }
        if let Some(cities) = &self.city_availability {
            record.city_availability = cities.clone();
        }
        if let Some(stock) = self.stock {
            record.stock = stock;
        }
    }
}

fn normalize(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let t = s.trim().to_string();
        if t.is_empty() {
            None
        } else {
            Some(t)
        }
    })
}
