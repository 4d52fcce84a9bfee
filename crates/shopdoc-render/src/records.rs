//! Input records
//!
//! These are assembled by the data layer and handed to the engine fully
//! populated. The engine reads them and never writes back. Field names
//! follow the camelCase JSON produced by the web backend.

use crate::types::InvoiceCopy;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Shared Parties
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Company {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub gstin: Option<String>,
    /// Logo reference: absolute path, web path, URL, or absent
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Branch {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub gstin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Customer {
    pub name: String,
    pub phone: Option<String>,
    pub alternate_phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub gstin: Option<String>,
}

/// Staff member referenced by a job sheet
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StaffMember {
    pub name: String,
    pub phone: Option<String>,
}

// =============================================================================
// Job Sheet
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceDetails {
    pub ticket_number: String,
    pub device_model: String,
    pub device_imei: Option<String>,
    pub device_password: Option<String>,
    pub device_pattern: Option<String>,
    pub issue: String,
    pub diagnosis: Option<String>,
    pub estimated_cost: f64,
    pub labour_cost: f64,
    pub actual_cost: f64,
    pub discount: f64,
    pub advance_payment: f64,
    pub is_warranty: bool,
    pub is_repeat_service: bool,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub expected_delivery: Option<DateTime<Utc>>,
}

/// Device registered to the customer, when the ticket references one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CustomerDevice {
    pub brand: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub imei: Option<String>,
    pub color: Option<String>,
}

/// A replacement part already included in the cost estimate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TaggedPart {
    pub name: String,
    pub part_number: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalState {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalState {
    pub fn label(self) -> &'static str {
        match self {
            ApprovalState::Pending => "Pending",
            ApprovalState::Approved => "Approved",
            ApprovalState::Rejected => "Rejected",
        }
    }
}

/// How the customer communicated an approval decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApprovalMethod {
    Phone,
    InPerson,
    Whatsapp,
    Sms,
    Email,
    #[serde(other)]
    Other,
}

impl ApprovalMethod {
    pub fn label(self) -> &'static str {
        match self {
            ApprovalMethod::Phone => "Phone",
            ApprovalMethod::InPerson => "In person",
            ApprovalMethod::Whatsapp => "WhatsApp",
            ApprovalMethod::Sms => "SMS",
            ApprovalMethod::Email => "Email",
            ApprovalMethod::Other => "Other",
        }
    }
}

/// A part found mid-repair that needs customer approval before billing
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExtraSparePart {
    pub name: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
    pub approval_state: ApprovalState,
    pub approval_method: Option<ApprovalMethod>,
}

/// Per-branch presentation settings for job sheets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSheetTemplate {
    pub terms: Option<String>,
    pub footer_text: Option<String>,
    pub show_logo: bool,
    pub show_contact: bool,
    pub show_signatures: bool,
}

impl Default for JobSheetTemplate {
    fn default() -> Self {
        Self {
            terms: None,
            footer_text: None,
            show_logo: true,
            show_contact: true,
            show_signatures: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobSheetRecord {
    pub job_sheet_number: String,
    pub service: ServiceDetails,
    pub customer: Customer,
    pub customer_device: Option<CustomerDevice>,
    pub accessories: Vec<String>,
    pub damage_conditions: Vec<String>,
    pub faults: Vec<String>,
    pub tagged_parts: Vec<TaggedPart>,
    pub extra_spare_parts: Vec<ExtraSparePart>,
    pub branch: Branch,
    pub company: Company,
    pub technician: Option<StaffMember>,
    pub created_by: Option<StaffMember>,
    pub template: JobSheetTemplate,
}

impl JobSheetRecord {
    /// Ticket number lives on the service sub-record
    pub fn ticket_number(&self) -> &str {
        &self.service.ticket_number
    }

    /// Balance after advance: estimate - discount - advance, floored at zero
    pub fn balance_due(&self) -> f64 {
        (self.service.estimated_cost - self.service.discount - self.service.advance_payment)
            .max(0.0)
    }
}

// =============================================================================
// Invoice
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceServiceSummary {
    pub ticket_number: Option<String>,
    pub device_model: Option<String>,
    pub issue: Option<String>,
    pub labour_cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoicePart {
    pub name: String,
    pub hsn_code: Option<String>,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Payment {
    pub date: Option<DateTime<Utc>>,
    pub amount: f64,
    pub method: String,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    Partial,
    #[default]
    Unpaid,
}

impl PaymentStatus {
    pub fn label(self) -> &'static str {
        match self {
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Partial => "PARTIALLY PAID",
            PaymentStatus::Unpaid => "UNPAID",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceRecord {
    pub invoice_number: String,
    pub invoice_date: Option<DateTime<Utc>>,
    /// Copy requested by the caller when none is given at render time
    pub copy_type: Option<InvoiceCopy>,
    pub service: InvoiceServiceSummary,
    pub customer: Customer,
    pub branch: Branch,
    pub company: Company,
    pub parts: Vec<InvoicePart>,
    pub payments: Vec<Payment>,
    pub subtotal: f64,
    pub discount: f64,
    pub cgst_rate: f64,
    pub sgst_rate: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub paid_amount: f64,
    pub balance_amount: f64,
    pub payment_status: PaymentStatus,
    pub notes: Option<String>,
}

impl InvoiceRecord {
    /// Amount tax is applied to
    pub fn taxable_amount(&self) -> f64 {
        (self.subtotal - self.discount).max(0.0)
    }
}

// =============================================================================
// Estimate
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EstimateServiceRef {
    pub ticket_number: String,
    pub device_model: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LineItem {
    pub description: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EstimateRecord {
    pub estimate_number: String,
    pub estimate_date: Option<DateTime<Utc>>,
    pub valid_until: Option<DateTime<Utc>>,
    pub validity_days: Option<u32>,
    pub customer: Customer,
    pub service: Option<EstimateServiceRef>,
    pub items: Vec<LineItem>,
    pub subtotal: f64,
    pub tax_amount: f64,
    pub total_amount: f64,
    pub notes: Option<String>,
    pub branch: Branch,
    pub company: Company,
}
