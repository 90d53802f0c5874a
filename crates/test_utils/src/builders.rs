//! Test Data Builders
//!
//! Provides builder patterns for constructing ledger inputs with sensible
//! defaults. Tests set only the fields they care about.

use chrono::NaiveDate;
use core_kernel::{ContractId, HouseId, Money};
use domain_sales::contract::{NewContract, SignatureStatus, FIRST_SALE};
use domain_sales::house::NewHouse;
use domain_sales::payment::NewPayment;
use domain_sales::receipt::NewReceipt;
use domain_sales::resale::NewResaleListing;
use rust_decimal::Decimal;

use crate::fixtures::{AreaFixtures, DateFixtures, MoneyFixtures, StringFixtures};

/// Builder for house inputs
pub struct NewHouseBuilder {
    inner: NewHouse,
}

impl Default for NewHouseBuilder {
    fn default() -> Self {
        Self::new(1)
    }
}

impl NewHouseBuilder {
    /// Creates a phase 1 house with the standard price split
    pub fn new(house_number: i64) -> Self {
        Self {
            inner: NewHouse {
                house_number,
                block_number: 1,
                total_area: AreaFixtures::plot_area(),
                building_area: AreaFixtures::building_area(),
                total_price: MoneyFixtures::house_price(),
                down_payment: MoneyFixtures::down_payment(),
                loan_amount: MoneyFixtures::loan(),
                phase: 1,
                outlook: None,
                floors: Some(2),
                building_material: Some(StringFixtures::building_material().to_string()),
                additional_specs: None,
            },
        }
    }

    pub fn block(mut self, block_number: i64) -> Self {
        self.inner.block_number = block_number;
        self
    }

    pub fn phase(mut self, phase: u8) -> Self {
        self.inner.phase = phase;
        self
    }

    /// Sets price, down payment and loan together
    pub fn price(mut self, total: Money, down_payment: Money, loan: Money) -> Self {
        self.inner.total_price = total;
        self.inner.down_payment = down_payment;
        self.inner.loan_amount = loan;
        self
    }

    pub fn outlook(mut self, outlook: Money) -> Self {
        self.inner.outlook = Some(outlook);
        self
    }

    pub fn floors(mut self, floors: Option<i32>) -> Self {
        self.inner.floors = floors;
        self
    }

    pub fn areas(mut self, total_area: Decimal, building_area: Decimal) -> Self {
        self.inner.total_area = total_area;
        self.inner.building_area = building_area;
        self
    }

    pub fn build(self) -> NewHouse {
        self.inner
    }
}

/// Builder for receipt inputs
pub struct NewReceiptBuilder {
    inner: NewReceipt,
}

impl NewReceiptBuilder {
    /// Creates a receipt for unit `unit_number` of block 1
    pub fn new(receipt_number: i64, unit_number: i64) -> Self {
        Self {
            inner: NewReceipt {
                receipt_number,
                receipt_date: DateFixtures::sale_date(),
                buyer_name: StringFixtures::buyer_name().to_string(),
                mobile_number: StringFixtures::mobile_number().to_string(),
                unit_number,
                block_number: 1,
                unit_area: AreaFixtures::plot_area(),
                amount_received: MoneyFixtures::received(),
                remaining_amount: MoneyFixtures::loan(),
                due_date: None,
                notes: None,
                house_id: None,
            },
        }
    }

    /// Links the receipt to a stored house
    pub fn for_house(mut self, house_id: HouseId) -> Self {
        self.inner.house_id = Some(house_id);
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.inner.receipt_date = date;
        self
    }

    pub fn buyer(mut self, name: impl Into<String>) -> Self {
        self.inner.buyer_name = name.into();
        self
    }

    pub fn amounts(mut self, received: Money, remaining: Money) -> Self {
        self.inner.amount_received = received;
        self.inner.remaining_amount = remaining;
        self
    }

    pub fn build(self) -> NewReceipt {
        self.inner
    }
}

/// Builder for contract inputs
pub struct NewContractBuilder {
    inner: NewContract,
}

impl NewContractBuilder {
    /// Creates an unnumbered contract for house `house_number`
    pub fn new(house_number: i64) -> Self {
        Self {
            inner: NewContract {
                contract_number: None,
                sale_date: DateFixtures::sale_date(),
                house_number,
                block_number: 1,
                area: AreaFixtures::plot_area(),
                floors: 2,
                buyer_name: StringFixtures::buyer_name().to_string(),
                mobile_number: StringFixtures::mobile_number().to_string(),
                sale_type: FIRST_SALE.to_string(),
                total_amount: MoneyFixtures::house_price(),
                down_payment: MoneyFixtures::down_payment(),
                loan_amount: MoneyFixtures::loan(),
                amount_paid: MoneyFixtures::down_payment(),
                contract_date: DateFixtures::sale_date(),
                buyer_signature: SignatureStatus::Pending,
                investor_signature: SignatureStatus::Pending,
                contract_receipt: SignatureStatus::Pending,
                next_payment_due_date: None,
            },
        }
    }

    pub fn number(mut self, contract_number: i64) -> Self {
        self.inner.contract_number = Some(contract_number);
        self
    }

    pub fn buyer(mut self, name: impl Into<String>) -> Self {
        self.inner.buyer_name = name.into();
        self
    }

    /// Sets both the sale date and the contract date
    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.inner.sale_date = date;
        self.inner.contract_date = date;
        self
    }

    pub fn amounts(mut self, total: Money, paid: Money) -> Self {
        self.inner.total_amount = total;
        self.inner.amount_paid = paid;
        self
    }

    pub fn signed(mut self) -> Self {
        self.inner.buyer_signature = SignatureStatus::Done;
        self.inner.investor_signature = SignatureStatus::Done;
        self.inner.contract_receipt = SignatureStatus::Done;
        self
    }

    pub fn build(self) -> NewContract {
        self.inner
    }
}

/// Builder for payment inputs
pub struct NewPaymentBuilder {
    inner: NewPayment,
}

impl NewPaymentBuilder {
    /// Creates a standard installment on the recent payment date
    pub fn new(contract_id: ContractId) -> Self {
        Self {
            inner: NewPayment {
                contract_id,
                payment_date: DateFixtures::recent_payment(),
                amount: MoneyFixtures::installment(),
                payment_type: None,
                notes: None,
                next_payment_due_date: None,
            },
        }
    }

    pub fn amount(mut self, amount: Money) -> Self {
        self.inner.amount = amount;
        self
    }

    pub fn dated(mut self, date: NaiveDate) -> Self {
        self.inner.payment_date = date;
        self
    }

    pub fn payment_type(mut self, payment_type: impl Into<String>) -> Self {
        self.inner.payment_type = Some(payment_type.into());
        self
    }

    /// Due date agreed at the counter
    pub fn agreed_due_date(mut self, date: NaiveDate) -> Self {
        self.inner.next_payment_due_date = Some(date);
        self
    }

    pub fn build(self) -> NewPayment {
        self.inner
    }
}

/// Builder for resale listing inputs
pub struct NewResaleBuilder {
    inner: NewResaleListing,
}

impl NewResaleBuilder {
    pub fn new(house_id: HouseId) -> Self {
        Self {
            inner: NewResaleListing {
                house_id,
                source: StringFixtures::resale_source().to_string(),
                mobile_number: StringFixtures::mobile_number().to_string(),
                contact_date: DateFixtures::recent_payment(),
                remaining_amount: None,
                floors: None,
                building_material: None,
                additional_specs: None,
            },
        }
    }

    pub fn contacted(mut self, date: NaiveDate) -> Self {
        self.inner.contact_date = date;
        self
    }

    pub fn remaining(mut self, amount: Money) -> Self {
        self.inner.remaining_amount = Some(amount);
        self
    }

    pub fn build(self) -> NewResaleListing {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_default_inputs_pass_validation() {
        assert!(NewHouseBuilder::new(7).build().validate_all().is_ok());
        assert!(NewReceiptBuilder::new(1, 7).build().validate_all().is_ok());
        assert!(NewContractBuilder::new(7).build().validate_all().is_ok());
        assert!(NewPaymentBuilder::new(ContractId::new(1)).build().validate_all().is_ok());
    }

    #[test]
    fn test_price_override() {
        let house = NewHouseBuilder::new(3)
            .price(Money::new(dec!(90000)), Money::zero(), Money::zero())
            .build();
        assert_eq!(house.total_price, Money::new(dec!(90000)));
        assert!(house.loan_amount.is_zero());
    }
}
