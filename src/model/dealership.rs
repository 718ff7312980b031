//! Typed rows for the dealership back office: inventory, sales,
//! maintenance, customer inquiries and the profit report.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::grid::{CellValue, Column, FieldError, Row};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CarStatus {
    #[default]
    Available,
    Sold,
    Reserved,
}

impl CarStatus {
    pub const ALL: [CarStatus; 3] = [CarStatus::Available, CarStatus::Sold, CarStatus::Reserved];

    pub fn as_str(&self) -> &'static str {
        match self {
            CarStatus::Available => "available",
            CarStatus::Sold => "sold",
            CarStatus::Reserved => "reserved",
        }
    }
}

impl fmt::Display for CarStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(CarStatus::Available),
            "sold" => Ok(CarStatus::Sold),
            "reserved" => Ok(CarStatus::Reserved),
            other => Err(format!("unknown status '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InquiryStatus {
    #[default]
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub const ALL: [InquiryStatus; 3] = [
        InquiryStatus::New,
        InquiryStatus::Contacted,
        InquiryStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Closed => "closed",
        }
    }
}

impl FromStr for InquiryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "new" => Ok(InquiryStatus::New),
            "contacted" => Ok(InquiryStatus::Contacted),
            "closed" => Ok(InquiryStatus::Closed),
            other => Err(format!("unknown inquiry status '{}'", other)),
        }
    }
}

/// A car in the lot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub color: String,
    pub price: f64,
    pub mileage: i64,
    pub status: CarStatus,
}

impl Row for Car {
    fn fields() -> Option<&'static [&'static str]> {
        Some(&[
            "id", "make", "model", "year", "color", "price", "mileage", "status",
        ])
    }

    fn get(&self, key: &str) -> Option<CellValue> {
        Some(match key {
            "id" => self.id.into(),
            "make" => self.make.as_str().into(),
            "model" => self.model.as_str().into(),
            "year" => self.year.into(),
            "color" => self.color.as_str().into(),
            "price" => self.price.into(),
            "mileage" => self.mileage.into(),
            "status" => self.status.as_str().into(),
            _ => return None,
        })
    }

    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
        match key {
            "id" => self.id = int_field(key, &value)?,
            "make" => self.make = text_field(key, &value)?,
            "model" => self.model = text_field(key, &value)?,
            "year" => {
                let year = int_field(key, &value)?;
                if !(1886..=2100).contains(&year) {
                    return Err(FieldError::invalid(key, value.to_string(), "not a plausible model year"));
                }
                self.year = year;
            }
            "color" => self.color = text_field(key, &value)?,
            "price" => self.price = money_field(key, &value)?,
            "mileage" => {
                let mileage = match &value {
                    CellValue::Text(text) => {
                        let digits = text.replace(',', "");
                        int_field(key, &CellValue::text(digits.trim_end_matches("miles").trim()))?
                    }
                    other => int_field(key, other)?,
                };
                if mileage < 0 {
                    return Err(FieldError::invalid(key, value.to_string(), "must not be negative"));
                }
                self.mileage = mileage;
            }
            "status" => {
                self.status = value
                    .to_string()
                    .parse()
                    .map_err(|reason: String| FieldError::invalid(key, value.to_string(), reason))?
            }
            _ => return Err(FieldError::unknown(key)),
        }
        Ok(())
    }
}

/// A completed sale of a car.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub car_id: i64,
    pub sale_price: f64,
    pub sale_date: NaiveDate,
    pub customer_name: String,
    pub customer_email: String,
}

impl Row for Sale {
    fn fields() -> Option<&'static [&'static str]> {
        Some(&[
            "id",
            "car_id",
            "sale_price",
            "sale_date",
            "customer_name",
            "customer_email",
        ])
    }

    fn get(&self, key: &str) -> Option<CellValue> {
        Some(match key {
            "id" => self.id.into(),
            "car_id" => self.car_id.into(),
            "sale_price" => self.sale_price.into(),
            "sale_date" => self.sale_date.format(DATE_FORMAT).to_string().into(),
            "customer_name" => self.customer_name.as_str().into(),
            "customer_email" => self.customer_email.as_str().into(),
            _ => return None,
        })
    }

    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
        match key {
            "id" => self.id = int_field(key, &value)?,
            "car_id" => self.car_id = int_field(key, &value)?,
            "sale_price" => self.sale_price = money_field(key, &value)?,
            "sale_date" => self.sale_date = date_field(key, &value)?,
            "customer_name" => self.customer_name = text_field(key, &value)?,
            "customer_email" => self.customer_email = email_field(key, &value)?,
            _ => return Err(FieldError::unknown(key)),
        }
        Ok(())
    }
}

/// A repair or service performed on a car.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MaintenanceRecord {
    pub id: i64,
    pub car_id: i64,
    pub repair_date: NaiveDate,
    pub total_cost: f64,
    pub description: String,
}

impl Row for MaintenanceRecord {
    fn fields() -> Option<&'static [&'static str]> {
        Some(&["id", "car_id", "repair_date", "total_cost", "description"])
    }

    fn get(&self, key: &str) -> Option<CellValue> {
        Some(match key {
            "id" => self.id.into(),
            "car_id" => self.car_id.into(),
            "repair_date" => self.repair_date.format(DATE_FORMAT).to_string().into(),
            "total_cost" => self.total_cost.into(),
            "description" => self.description.as_str().into(),
            _ => return None,
        })
    }

    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
        match key {
            "id" => self.id = int_field(key, &value)?,
            "car_id" => self.car_id = int_field(key, &value)?,
            "repair_date" => self.repair_date = date_field(key, &value)?,
            "total_cost" => self.total_cost = money_field(key, &value)?,
            "description" => self.description = value.to_string(),
            _ => return Err(FieldError::unknown(key)),
        }
        Ok(())
    }
}

/// A customer message, optionally about a specific car.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: i64,
    pub car_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: NaiveDate,
}

impl Row for Inquiry {
    fn fields() -> Option<&'static [&'static str]> {
        Some(&[
            "id",
            "car_id",
            "name",
            "email",
            "phone",
            "message",
            "status",
            "created_at",
        ])
    }

    fn get(&self, key: &str) -> Option<CellValue> {
        Some(match key {
            "id" => self.id.into(),
            "car_id" => self.car_id.map_or(CellValue::Null, CellValue::Int),
            "name" => self.name.as_str().into(),
            "email" => self.email.as_str().into(),
            "phone" => self.phone.as_str().into(),
            "message" => self.message.as_str().into(),
            "status" => self.status.as_str().into(),
            "created_at" => self.created_at.format(DATE_FORMAT).to_string().into(),
            _ => return None,
        })
    }

    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
        match key {
            "id" => self.id = int_field(key, &value)?,
            // "-" or blank unlinks the inquiry from any car
            "car_id" => {
                self.car_id = match value.to_string().trim() {
                    "" | "-" => None,
                    _ => Some(int_field(key, &value)?),
                }
            }
            "name" => self.name = text_field(key, &value)?,
            "email" => self.email = email_field(key, &value)?,
            "phone" => self.phone = value.to_string().trim().to_string(),
            "message" => self.message = text_field(key, &value)?,
            "status" => {
                self.status = value
                    .to_string()
                    .parse()
                    .map_err(|reason: String| FieldError::invalid(key, value.to_string(), reason))?
            }
            "created_at" => self.created_at = date_field(key, &value)?,
            _ => return Err(FieldError::unknown(key)),
        }
        Ok(())
    }
}

/// A car's purchase and selling price, for the profit report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CarReport {
    pub id: i64,
    pub make: String,
    pub model: String,
    pub year: i64,
    pub purchase_price: f64,
    pub selling_price: f64,
}

impl CarReport {
    pub fn profit(&self) -> f64 {
        self.selling_price - self.purchase_price
    }
}

impl Row for CarReport {
    fn fields() -> Option<&'static [&'static str]> {
        Some(&[
            "id",
            "make",
            "model",
            "year",
            "purchase_price",
            "selling_price",
            "profit",
        ])
    }

    fn get(&self, key: &str) -> Option<CellValue> {
        Some(match key {
            "id" => self.id.into(),
            "make" => self.make.as_str().into(),
            "model" => self.model.as_str().into(),
            "year" => self.year.into(),
            "purchase_price" => self.purchase_price.into(),
            "selling_price" => self.selling_price.into(),
            "profit" => self.profit().into(),
            _ => return None,
        })
    }

    fn set(&mut self, key: &str, value: CellValue) -> Result<(), FieldError> {
        match key {
            "id" => self.id = int_field(key, &value)?,
            "make" => self.make = text_field(key, &value)?,
            "model" => self.model = text_field(key, &value)?,
            "year" => self.year = int_field(key, &value)?,
            "purchase_price" => self.purchase_price = money_field(key, &value)?,
            "selling_price" => self.selling_price = money_field(key, &value)?,
            "profit" => {
                return Err(FieldError::invalid(
                    key,
                    value.to_string(),
                    "derived from the purchase and selling price",
                ))
            }
            _ => return Err(FieldError::unknown(key)),
        }
        Ok(())
    }
}

fn text_field(key: &str, value: &CellValue) -> Result<String, FieldError> {
    let text = value.to_string().trim().to_string();
    if text.is_empty() {
        return Err(FieldError::invalid(key, text, "must not be empty"));
    }
    Ok(text)
}

fn email_field(key: &str, value: &CellValue) -> Result<String, FieldError> {
    let email = text_field(key, value)?;
    if !email.contains('@') {
        return Err(FieldError::invalid(key, email, "not an email address"));
    }
    Ok(email)
}

fn int_field(key: &str, value: &CellValue) -> Result<i64, FieldError> {
    value
        .as_i64()
        .ok_or_else(|| FieldError::invalid(key, value.to_string(), "expected a whole number"))
}

/// Accepts plain numbers as well as `$20,000` style amounts.
fn money_field(key: &str, value: &CellValue) -> Result<f64, FieldError> {
    let amount = match value {
        CellValue::Int(i) => *i as f64,
        CellValue::Float(f) => *f,
        other => {
            let cleaned: String = other
                .to_string()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | ' '))
                .collect();
            CellValue::Text(cleaned)
                .as_f64()
                .ok_or_else(|| FieldError::invalid(key, other.to_string(), "expected an amount"))?
        }
    };
    if !amount.is_finite() || amount < 0.0 {
        return Err(FieldError::invalid(key, value.to_string(), "amount must be zero or more"));
    }
    Ok(amount)
}

fn date_field(key: &str, value: &CellValue) -> Result<NaiveDate, FieldError> {
    NaiveDate::parse_from_str(value.to_string().trim(), DATE_FORMAT)
        .map_err(|e| FieldError::invalid(key, value.to_string(), format!("expected YYYY-MM-DD ({})", e)))
}

/// `20000` as `$20,000.00`.
pub fn format_money(value: &CellValue) -> String {
    let Some(amount) = value.as_f64() else {
        return value.to_string();
    };
    let cents = (amount * 100.0).round() as i64;
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}${}.{:02}", sign, group_thousands(cents / 100), cents % 100)
}

fn format_mileage(value: &CellValue) -> String {
    match value.as_i64() {
        Some(miles) if miles >= 0 => format!("{} mi", group_thousands(miles as u64)),
        _ => value.to_string(),
    }
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub fn car_columns() -> Vec<Column<Car>> {
    vec![
        Column::new("id", "ID").read_only(),
        Column::new("make", "Make"),
        Column::new("model", "Model"),
        Column::new("year", "Year"),
        Column::new("color", "Color"),
        Column::new("price", "Price").render(format_money),
        Column::new("mileage", "Mileage").render(format_mileage),
        Column::new("status", "Status").options(CarStatus::ALL.iter().map(|s| s.as_str())),
    ]
}

pub fn sale_columns() -> Vec<Column<Sale>> {
    vec![
        Column::new("id", "ID").read_only(),
        Column::new("car_id", "Car"),
        Column::new("sale_price", "Sale Price").render(format_money),
        Column::new("sale_date", "Date"),
        Column::new("customer_name", "Customer"),
        Column::new("customer_email", "Email"),
    ]
}

pub fn maintenance_columns() -> Vec<Column<MaintenanceRecord>> {
    vec![
        Column::new("id", "ID").read_only(),
        Column::new("car_id", "Car"),
        Column::new("repair_date", "Repair Date"),
        Column::new("total_cost", "Cost").render(format_money),
        Column::new("description", "Description"),
    ]
}

pub fn inquiry_columns() -> Vec<Column<Inquiry>> {
    vec![
        Column::new("id", "ID").read_only(),
        Column::new("car_id", "Car"),
        Column::new("name", "Name"),
        Column::new("email", "Email"),
        Column::new("phone", "Phone"),
        Column::new("message", "Message"),
        Column::new("status", "Status").options(InquiryStatus::ALL.iter().map(|s| s.as_str())),
        Column::new("created_at", "Received"),
    ]
}

pub fn report_columns() -> Vec<Column<CarReport>> {
    vec![
        Column::new("id", "ID").read_only(),
        Column::new("make", "Make"),
        Column::new("model", "Model"),
        Column::new("year", "Year"),
        Column::new("purchase_price", "Purchase Price").render(format_money),
        Column::new("selling_price", "Selling Price").render(format_money),
        Column::new("profit", "Profit").render(format_money).read_only(),
    ]
}

pub fn sample_cars() -> Vec<Car> {
    let lot = [
        ("Toyota", "Corolla", 2020, "Blue", 20_000.0, 30_000, CarStatus::Available),
        ("Honda", "Civic", 2021, "Red", 22_000.0, 15_000, CarStatus::Available),
        ("Ford", "Mustang", 2022, "Black", 30_000.0, 10_000, CarStatus::Sold),
        ("Chevrolet", "Malibu", 2019, "White", 18_000.0, 40_000, CarStatus::Available),
        ("Nissan", "Altima", 2020, "Silver", 19_500.0, 25_000, CarStatus::Reserved),
        ("BMW", "3 Series", 2022, "Gray", 35_000.0, 5_000, CarStatus::Available),
        ("Audi", "A4", 2021, "Green", 37_000.0, 8_000, CarStatus::Sold),
        ("Mercedes-Benz", "C-Class", 2022, "Blue", 40_000.0, 2_000, CarStatus::Available),
        ("Hyundai", "Sonata", 2021, "Yellow", 24_000.0, 12_000, CarStatus::Available),
        ("Kia", "Optima", 2020, "Black", 23_000.0, 20_000, CarStatus::Reserved),
        ("Subaru", "Outback", 2021, "Red", 28_000.0, 15_000, CarStatus::Available),
        ("Mazda", "CX-5", 2022, "White", 30_000.0, 7_000, CarStatus::Sold),
    ];
    lot.into_iter()
        .zip(1..)
        .map(|((make, model, year, color, price, mileage, status), id)| Car {
            id,
            make: make.into(),
            model: model.into(),
            year,
            color: color.into(),
            price,
            mileage,
            status,
        })
        .collect()
}

pub fn sample_sales() -> Vec<Sale> {
    let sales = [
        (3, 29_500.0, (2024, 3, 14), "Dana Whitfield", "dana@example.com"),
        (7, 36_200.0, (2024, 5, 2), "Luis Ortega", "lortega@example.com"),
        (12, 29_900.0, (2024, 6, 21), "Priya Nair", "priya.nair@example.com"),
    ];
    sales
        .into_iter()
        .zip(1..)
        .filter_map(|((car_id, sale_price, (y, m, d), name, email), id)| {
            Some(Sale {
                id,
                car_id,
                sale_price,
                sale_date: NaiveDate::from_ymd_opt(y, m, d)?,
                customer_name: name.into(),
                customer_email: email.into(),
            })
        })
        .collect()
}

pub fn sample_maintenance() -> Vec<MaintenanceRecord> {
    let records = [
        (1, (2024, 1, 9), 240.0, "Brake pads and rotor resurfacing"),
        (4, (2024, 2, 17), 89.99, "Oil change and filter"),
        (6, (2024, 4, 3), 1_150.0, "Replaced timing belt"),
        (4, (2024, 7, 28), 420.5, "Four new tires"),
    ];
    records
        .into_iter()
        .zip(1..)
        .filter_map(|((car_id, (y, m, d), total_cost, description), id)| {
            Some(MaintenanceRecord {
                id,
                car_id,
                repair_date: NaiveDate::from_ymd_opt(y, m, d)?,
                total_cost,
                description: description.into(),
            })
        })
        .collect()
}

pub fn sample_inquiries() -> Vec<Inquiry> {
    let inquiries = [
        (
            Some(2),
            "Marcus Lee",
            "marcus.lee@example.com",
            "555-0142",
            "Is the Civic still available for a test drive this weekend?",
            InquiryStatus::New,
            (2024, 8, 3),
        ),
        (
            Some(5),
            "Ana Ruiz",
            "ana.ruiz@example.com",
            "",
            "Would you hold the Altima until Friday?",
            InquiryStatus::Contacted,
            (2024, 7, 29),
        ),
        (
            None,
            "Tom Becker",
            "tbecker@example.com",
            "555-0199",
            "Do you take trade-ins?",
            InquiryStatus::Closed,
            (2024, 7, 12),
        ),
        (
            Some(8),
            "Grace Kim",
            "grace.kim@example.com",
            "",
            "What financing options do you offer on the C-Class?",
            InquiryStatus::New,
            (2024, 8, 5),
        ),
    ];
    inquiries
        .into_iter()
        .zip(1..)
        .filter_map(|((car_id, name, email, phone, message, status, (y, m, d)), id)| {
            Some(Inquiry {
                id,
                car_id,
                name: name.into(),
                email: email.into(),
                phone: phone.into(),
                message: message.into(),
                status,
                created_at: NaiveDate::from_ymd_opt(y, m, d)?,
            })
        })
        .collect()
}

/// Report rows for the sold cars in [`sample_cars`].
pub fn sample_report() -> Vec<CarReport> {
    let sold = [
        (3, "Ford", "Mustang", 2022, 26_000.0, 29_500.0),
        (7, "Audi", "A4", 2021, 31_500.0, 36_200.0),
        (12, "Mazda", "CX-5", 2022, 30_400.0, 29_900.0),
    ];
    sold.into_iter()
        .map(|(id, make, model, year, purchase_price, selling_price)| CarReport {
            id,
            make: make.into(),
            model: model.into(),
            year,
            purchase_price,
            selling_price,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{Features, Grid, GridError};

    #[test]
    fn sample_data_fits_column_sets() {
        assert!(Grid::new(car_columns(), sample_cars(), Features::default()).is_ok());
        assert!(Grid::new(sale_columns(), sample_sales(), Features::default()).is_ok());
        assert!(Grid::new(maintenance_columns(), sample_maintenance(), Features::default()).is_ok());
        assert!(Grid::new(inquiry_columns(), sample_inquiries(), Features::default()).is_ok());
        assert!(Grid::new(report_columns(), sample_report(), Features::default()).is_ok());
        assert_eq!(sample_sales().len(), 3);
        assert_eq!(sample_maintenance().len(), 4);
        assert_eq!(sample_inquiries().len(), 4);
        assert_eq!(sample_report().len(), 3);
    }

    #[test]
    fn status_is_restricted_to_known_options() {
        let mut car = sample_cars().remove(0);
        car.set("status", "Sold".into()).unwrap();
        assert_eq!(car.status, CarStatus::Sold);
        assert!(car.set("status", "scrapped".into()).is_err());
        assert_eq!(car.status, CarStatus::Sold);
    }

    #[test]
    fn year_and_mileage_are_coerced_from_text() {
        let mut car = Car::default();
        car.set("year", "2019".into()).unwrap();
        car.set("mileage", "30,000 miles".into()).unwrap();
        assert_eq!((car.year, car.mileage), (2019, 30_000));
        assert!(car.set("year", "next year".into()).is_err());
        assert!(car.set("year", CellValue::Int(1500)).is_err());
        assert!(car.set("mileage", CellValue::Int(-5)).is_err());
    }

    #[test]
    fn money_accepts_dollar_amounts() {
        let mut car = Car::default();
        car.set("price", "$19,500".into()).unwrap();
        assert_eq!(car.price, 19_500.0);
        assert!(car.set("price", "-10".into()).is_err());
        assert!(car.set("price", "cheap".into()).is_err());
    }

    #[test]
    fn dates_must_be_iso() {
        let mut sale = Sale::default();
        sale.set("sale_date", "2024-02-29".into()).unwrap();
        assert_eq!(sale.sale_date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert!(sale.set("sale_date", "2023-02-29".into()).is_err());
        assert!(sale.set("sale_date", "03/14/2024".into()).is_err());
    }

    #[test]
    fn money_and_mileage_display() {
        assert_eq!(format_money(&CellValue::Float(20_000.0)), "$20,000.00");
        assert_eq!(format_money(&CellValue::Float(89.99)), "$89.99");
        assert_eq!(format_money(&CellValue::Int(-1_000)), "-$1,000.00");
        assert_eq!(format_mileage(&CellValue::Int(5_000)), "5,000 mi");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
        assert_eq!(group_thousands(999), "999");
    }

    #[test]
    fn inserting_a_car_through_the_grid() {
        let mut grid = Grid::new(car_columns(), sample_cars(), Features::default()).unwrap();
        let mut draft = grid.new_draft();
        for (key, value) in [
            ("make", "Volvo"),
            ("model", "XC60"),
            ("year", "2023"),
            ("color", "Silver"),
            ("price", "$41,000"),
            ("mileage", "1,200"),
            ("status", "available"),
        ] {
            assert!(draft.set(key, value));
        }
        assert_eq!(grid.insert_row(&mut draft).unwrap(), 13);
        let car = grid.row(12).unwrap();
        assert_eq!(car.price, 41_000.0);
        assert_eq!(car.mileage, 1_200);
    }

    #[test]
    fn bad_draft_value_is_a_validation_error() {
        let mut grid = Grid::new(sale_columns(), sample_sales(), Features::default()).unwrap();
        let mut draft = grid.new_draft();
        for key in ["car_id", "sale_price", "customer_name", "customer_email"] {
            draft.set(key, "1");
        }
        draft.set("customer_email", "nobody");
        draft.set("sale_date", "yesterday");
        let err = grid.insert_row(&mut draft).unwrap_err();
        assert!(matches!(err, GridError::Validation { reason: Some(_), .. }));
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn global_search_over_dealership_rows() {
        let mut grid = Grid::new(car_columns(), sample_cars(), Features::default()).unwrap();
        grid.set_global_filter("hond").unwrap();
        assert_eq!(grid.window().filtered_count, 1);
        grid.set_global_filter("reserved").unwrap();
        assert_eq!(grid.window().filtered_count, 2);
    }
    #[test]
    fn inquiry_status_moves_through_its_options() {
        let mut grid = Grid::new(inquiry_columns(), sample_inquiries(), Features::default()).unwrap();
        let status = grid
            .columns()
            .iter()
            .find(|c| c.key() == "status")
            .and_then(|c| c.choices())
            .unwrap()
            .to_vec();
        assert_eq!(
            status,
            vec![
                CellValue::text("new"),
                CellValue::text("contacted"),
                CellValue::text("closed")
            ]
        );

        grid.update_cell(0, "status", "contacted".into()).unwrap();
        assert_eq!(grid.row(0).unwrap().status, InquiryStatus::Contacted);
        assert!(grid.update_cell(0, "status", "spam".into()).is_err());

        grid.apply_filter_expression("status = 'new'").unwrap();
        assert_eq!(grid.window().filtered_count, 1);
    }

    #[test]
    fn inquiry_car_link_is_optional() {
        let mut inquiry = sample_inquiries().remove(0);
        inquiry.set("car_id", "-".into()).unwrap();
        assert_eq!(inquiry.car_id, None);
        assert_eq!(inquiry.get("car_id"), Some(CellValue::Null));
        inquiry.set("car_id", "9".into()).unwrap();
        assert_eq!(inquiry.car_id, Some(9));
        assert!(inquiry.set("email", "nobody".into()).is_err());
    }

    #[test]
    fn profit_follows_prices_and_cannot_be_edited() {
        let mut grid = Grid::new(report_columns(), sample_report(), Features::default()).unwrap();
        assert_eq!(grid.row(0).unwrap().get("profit"), Some(CellValue::Float(3_500.0)));

        grid.update_cell(0, "selling_price", "$27,000".into()).unwrap();
        assert_eq!(grid.row(0).unwrap().profit(), 1_000.0);
        assert!(matches!(
            grid.update_cell(0, "profit", CellValue::Int(0)),
            Err(GridError::ReadOnlyColumn { .. })
        ));

        grid.toggle_sort("profit").unwrap();
        let first = grid.window().rows[0].source_index;
        assert_eq!(grid.rows()[first].model, "CX-5");
        let profit = report_columns().remove(6);
        assert_eq!(profit.display(&CellValue::Float(-500.0)), "-$500.00");
    }

    #[test]
    fn report_draft_leaves_out_profit() {
        let mut grid = Grid::new(report_columns(), sample_report(), Features::default()).unwrap();
        let mut draft = grid.new_draft();
        assert!(!draft.keys().any(|k| k == "profit"));
        for (key, value) in [
            ("make", "Kia"),
            ("model", "Optima"),
            ("year", "2020"),
            ("purchase_price", "19,000"),
            ("selling_price", "23,000"),
        ] {
            assert!(draft.set(key, value));
        }
        assert_eq!(grid.insert_row(&mut draft).unwrap(), 13);
        assert_eq!(grid.row(3).unwrap().profit(), 4_000.0);
    }
}
