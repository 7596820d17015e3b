//! Validation utilities

use crate::traits::*;
use crate::types::*;
use bigdecimal::BigDecimal;

/// Validate that an expense cost is positive
pub fn validate_positive_cost(cost: &BigDecimal) -> LedgerResult<()> {
    if *cost <= BigDecimal::from(0) {
        Err(LedgerError::Validation(
            "Cost must be positive".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a username is valid
pub fn validate_username(username: &str) -> LedgerResult<()> {
    if username.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Username cannot be empty".to_string(),
        ));
    }

    if username.len() > 50 {
        return Err(LedgerError::Validation(
            "Username cannot exceed 50 characters".to_string(),
        ));
    }

    // Check for valid characters (alphanumeric, dashes, underscores)
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(LedgerError::Validation(
            "Username can only contain alphanumeric characters, dashes, and underscores"
                .to_string(),
        ));
    }

    Ok(())
}

/// Validate that a household name is valid
pub fn validate_household_name(name: &str) -> LedgerResult<()> {
    if name.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Household name cannot be empty".to_string(),
        ));
    }

    if name.len() > 100 {
        return Err(LedgerError::Validation(
            "Household name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an expense description is valid
pub fn validate_expense_description(description: &str) -> LedgerResult<()> {
    if description.trim().is_empty() {
        return Err(LedgerError::Validation(
            "Expense description cannot be empty".to_string(),
        ));
    }

    if description.len() > 500 {
        return Err(LedgerError::Validation(
            "Expense description cannot exceed 500 characters".to_string(),
        ));
    }

    Ok(())
}

/// Enhanced expense validator with detailed checks
pub struct EnhancedExpenseValidator;

impl ExpenseValidator for EnhancedExpenseValidator {
    fn validate_expense(&self, expense: &Expense) -> LedgerResult<()> {
        // Basic validation
        expense.validate()?;

        // Enhanced validations
        validate_expense_description(&expense.description)?;
        validate_positive_cost(&expense.cost)?;

        if expense.payer_id.is_nil() {
            return Err(LedgerError::Validation(
                "Expense payer cannot be the nil member".to_string(),
            ));
        }

        Ok(())
    }
}
