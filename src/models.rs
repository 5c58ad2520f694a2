// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Contract Data Models
//!
//! Typed views of the TrustBond contract surface that dashboards keep in
//! sync: role management, KYC verification, trust scoring and loans. These
//! are the shapes a [`SyncSource`](crate::sync::SyncSource) typically
//! returns; the contracts themselves live on-chain.
//!
//! ## Model Categories
//!
//! - **Accounts**: [`WalletAddress`] and [`Role`]
//! - **KYC**: [`KycStatus`] and [`KycRecord`]
//! - **Trust**: [`TrustScore`] and its [`TrustTier`] banding
//! - **Loans**: [`Loan`] and its [`LoanStatus`] lifecycle

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Wallet Address Type
// =============================================================================

/// Ethereum-compatible wallet address wrapper.
///
/// Format: `0x` followed by 40 hexadecimal characters (20 bytes).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WalletAddress(pub String);

impl WalletAddress {
    /// Whether the address is `0x`-prefixed with exactly 40 hex digits.
    pub fn is_valid(&self) -> bool {
        match self.0.strip_prefix("0x") {
            Some(hex) => hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            None => false,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for WalletAddress {
    fn from(value: String) -> Self {
        WalletAddress(value)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        WalletAddress(value.to_string())
    }
}

impl From<WalletAddress> for String {
    fn from(value: WalletAddress) -> Self {
        value.0
    }
}

// =============================================================================
// Roles
// =============================================================================

/// Account roles recorded by the role-management contract.
///
/// - `Admin` - Manages banks and platform settings
/// - `Bank` - Verifies KYC submissions and issues loans
/// - `User` - Individual borrower
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Bank,
    #[default]
    User,
}

impl Role {
    /// Check if this role has at least the privileges of the required role.
    pub fn has_privilege(&self, required: Role) -> bool {
        match (self, required) {
            (Role::Admin, _) => true,
            // Banks can see what users see
            (Role::Bank, Role::Bank | Role::User) => true,
            (Role::User, Role::User) => true,
            _ => false,
        }
    }

    /// Parse role from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Role> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Some(Role::Admin),
            "bank" => Some(Role::Bank),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Bank => write!(f, "bank"),
            Role::User => write!(f, "user"),
        }
    }
}

// =============================================================================
// KYC
// =============================================================================

/// Verification state of a user's KYC submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KycStatus {
    #[default]
    NotSubmitted,
    Pending,
    Verified,
    Rejected,
}

/// A KYC record as stored by the KYC contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycRecord {
    pub user: WalletAddress,
    pub status: KycStatus,
    /// Content hash of the submitted document bundle.
    pub document_hash: Option<String>,
    /// Bank that reviewed the submission.
    pub verified_by: Option<WalletAddress>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl KycRecord {
    pub fn is_verified(&self) -> bool {
        self.status == KycStatus::Verified
    }
}

// =============================================================================
// Trust Score
// =============================================================================

/// Upper bound of the on-chain trust score.
pub const MAX_TRUST_SCORE: u8 = 100;

/// Coarse banding of a trust score for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustTier {
    Low,
    Medium,
    High,
}

/// Trust score of a user, clamped to `0..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustScore(u8);

impl TrustScore {
    pub fn new(value: u8) -> Self {
        TrustScore(value.min(MAX_TRUST_SCORE))
    }

    pub fn value(&self) -> u8 {
        self.0
    }

    pub fn tier(&self) -> TrustTier {
        match self.0 {
            0..=39 => TrustTier::Low,
            40..=74 => TrustTier::Medium,
            _ => TrustTier::High,
        }
    }
}

// =============================================================================
// Loans
// =============================================================================

/// Lifecycle of a loan in the loan contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Requested,
    Approved,
    Rejected,
    Active,
    Repaid,
    Defaulted,
}

impl LoanStatus {
    /// Whether the contract allows moving from `self` to `next`.
    pub fn can_transition_to(&self, next: LoanStatus) -> bool {
        use LoanStatus::*;
        matches!(
            (self, next),
            (Requested, Approved)
                | (Requested, Rejected)
                | (Approved, Active)
                | (Active, Repaid)
                | (Active, Defaulted)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoanStatus::Rejected | LoanStatus::Repaid | LoanStatus::Defaulted
        )
    }
}

/// A loan as recorded by the loan contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: u64,
    pub borrower: WalletAddress,
    pub lender: Option<WalletAddress>,
    /// Principal in the token's smallest unit, as a decimal string.
    pub principal: String,
    /// Interest rate in basis points.
    pub interest_bps: u32,
    pub status: LoanStatus,
    pub due_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_address_from_and_into_string() {
        let from_str: WalletAddress = "abc".into();
        assert_eq!(from_str.0, "abc");

        let to_string: String = WalletAddress("ghi".into()).into();
        assert_eq!(to_string, "ghi");
    }

    #[test]
    fn wallet_address_validation() {
        assert!(WalletAddress::from("0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12").is_valid());
        assert!(!WalletAddress::from("742d35Cc6634C0532925a3b844Bc9e7595f4aB12").is_valid());
        assert!(!WalletAddress::from("0x1234").is_valid());
        assert!(!WalletAddress::from("0xZZ2d35Cc6634C0532925a3b844Bc9e7595f4aB12").is_valid());
    }

    #[test]
    fn role_privileges() {
        assert!(Role::Admin.has_privilege(Role::Bank));
        assert!(Role::Bank.has_privilege(Role::User));
        assert!(!Role::Bank.has_privilege(Role::Admin));
        assert!(!Role::User.has_privilege(Role::Bank));
        assert_eq!(Role::parse("BANK"), Some(Role::Bank));
        assert_eq!(Role::parse("auditor"), None);
        assert_eq!(Role::default(), Role::User);
    }

    #[test]
    fn trust_score_clamps_and_bands() {
        assert_eq!(TrustScore::new(250).value(), MAX_TRUST_SCORE);
        assert_eq!(TrustScore::new(10).tier(), TrustTier::Low);
        assert_eq!(TrustScore::new(40).tier(), TrustTier::Medium);
        assert_eq!(TrustScore::new(75).tier(), TrustTier::High);
    }

    #[test]
    fn loan_lifecycle() {
        assert!(LoanStatus::Requested.can_transition_to(LoanStatus::Approved));
        assert!(LoanStatus::Active.can_transition_to(LoanStatus::Defaulted));
        assert!(!LoanStatus::Repaid.can_transition_to(LoanStatus::Active));
        assert!(!LoanStatus::Requested.can_transition_to(LoanStatus::Active));
        assert!(LoanStatus::Repaid.is_terminal());
        assert!(!LoanStatus::Active.is_terminal());
    }

    #[test]
    fn kyc_status_serializes_snake_case() {
        let json = serde_json::to_string(&KycStatus::NotSubmitted).unwrap();
        assert_eq!(json, r#""not_submitted""#);
    }
}
