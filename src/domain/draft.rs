use bigdecimal::BigDecimal;

use super::errors::ValidationError;
use super::money;
use super::order::{AreaId, Order, OrderItem, OrderStatus, ProductId, UnitMeasurementId, UserId};

#[derive(Debug, Clone, PartialEq)]
pub struct DraftLine {
    pub product_id: Option<ProductId>,
    pub unit_measurement_id: Option<UnitMeasurementId>,
    pub quantity: BigDecimal,
    pub price: BigDecimal,
}

impl DraftLine {
    pub fn new(
        product_id: ProductId,
        unit_measurement_id: UnitMeasurementId,
        quantity: BigDecimal,
        price: BigDecimal,
    ) -> Self {
        Self {
            product_id: Some(product_id),
            unit_measurement_id: Some(unit_measurement_id),
            quantity,
            price,
        }
    }

    /// An empty row, as added by the "add product" button.
    pub fn blank() -> Self {
        Self {
            product_id: None,
            unit_measurement_id: None,
            quantity: BigDecimal::from(1),
            price: money::zero(),
        }
    }
}

impl From<&OrderItem> for DraftLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            product_id: Some(item.product_id),
            unit_measurement_id: Some(item.unit_measurement_id),
            quantity: item.quantity.clone(),
            price: item.price.clone(),
        }
    }
}

/// Editable state of a composition session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub user_id: Option<UserId>,
    pub area_id: Option<AreaId>,
    pub status: OrderStatus,
    pub observation: Option<String>,
    pub lines: Vec<DraftLine>,
}

impl OrderDraft {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Self::default()
        }
    }

    pub fn from_order(order: &Order) -> Self {
        Self {
            user_id: Some(order.user_id),
            area_id: Some(order.area_id),
            status: order.status,
            observation: order.observation.clone(),
            lines: order.items.iter().map(DraftLine::from).collect(),
        }
    }

    pub fn push_line(&mut self, line: DraftLine) {
        self.lines.push(line);
    }

    pub fn remove_line(&mut self, index: usize) -> Result<DraftLine, ValidationError> {
        if index >= self.lines.len() {
            return Err(ValidationError::UnknownLine(index + 1));
        }
        Ok(self.lines.remove(index))
    }

    /// Sets a line's quantity from user input, truncated to two decimals.
    pub fn set_quantity(&mut self, index: usize, input: &str) -> Result<(), ValidationError> {
        let quantity = money::parse_quantity(input)?;
        let line = self
            .lines
            .get_mut(index)
            .ok_or(ValidationError::UnknownLine(index + 1))?;
        line.quantity = quantity;
        Ok(())
    }

    /// Running total shown while composing; lines without a price count as zero.
    pub fn total(&self) -> BigDecimal {
        money::order_total(self.lines.iter().map(|l| (&l.quantity, &l.price)))
    }

    pub fn validate(&self) -> Result<ValidatedOrder, ValidationError> {
        if self.lines.is_empty() {
            return Err(ValidationError::NoItems);
        }

        let zero = money::zero();
        let mut items = Vec::with_capacity(self.lines.len());
        for (i, line) in self.lines.iter().enumerate() {
            let n = i + 1;
            let product_id = line
                .product_id
                .ok_or(ValidationError::MissingProduct { line: n })?;
            let unit_measurement_id = line
                .unit_measurement_id
                .ok_or(ValidationError::MissingUnit { line: n })?;
            if line.quantity <= zero {
                return Err(ValidationError::NonPositiveQuantity { line: n });
            }
            if !money::has_valid_scale(&line.quantity) {
                return Err(ValidationError::TooManyDecimals { line: n });
            }
            if line.price < zero {
                return Err(ValidationError::NegativePrice { line: n });
            }
            items.push(OrderItem {
                product_id,
                quantity: line.quantity.clone(),
                price: line.price.clone(),
                unit_measurement_id,
            });
        }

        let user_id = self.user_id.ok_or(ValidationError::MissingUser)?;
        let area_id = self.area_id.ok_or(ValidationError::MissingArea)?;
        if area_id <= 0 {
            return Err(ValidationError::InvalidArea(area_id));
        }

        let total_amount =
            money::order_total(items.iter().map(|item| (&item.quantity, &item.price)));

        Ok(ValidatedOrder {
            user_id,
            area_id,
            status: self.status,
            observation: self.observation.clone(),
            items,
            total_amount,
        })
    }
}

/// A draft that passed validation, ready to be shaped into a request.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedOrder {
    pub user_id: UserId,
    pub area_id: AreaId,
    pub status: OrderStatus,
    pub observation: Option<String>,
    pub items: Vec<OrderItem>,
    pub total_amount: BigDecimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn valid_draft() -> OrderDraft {
        let mut draft = OrderDraft::for_user(7);
        draft.area_id = Some(3);
        draft.push_line(DraftLine::new(10, 1, dec("2"), dec("3.335")));
        draft.push_line(DraftLine::new(11, 2, dec("1"), dec("1.005")));
        draft
    }

    #[test]
    fn valid_draft_computes_rounded_total() {
        let validated = valid_draft().validate().unwrap();
        assert_eq!(validated.total_amount, dec("7.68"));
        assert_eq!(validated.items.len(), 2);
        assert_eq!(validated.area_id, 3);
    }

    #[test]
    fn empty_draft_is_rejected() {
        let mut draft = valid_draft();
        draft.lines.clear();
        assert_eq!(draft.validate(), Err(ValidationError::NoItems));
    }

    #[test]
    fn missing_area_is_rejected() {
        let mut draft = valid_draft();
        draft.area_id = None;
        assert_eq!(draft.validate(), Err(ValidationError::MissingArea));
    }

    #[test]
    fn missing_user_is_rejected() {
        let mut draft = valid_draft();
        draft.user_id = None;
        assert_eq!(draft.validate(), Err(ValidationError::MissingUser));
    }

    #[test]
    fn line_without_product_or_unit_is_rejected() {
        let mut draft = valid_draft();
        draft.push_line(DraftLine::blank());
        assert_eq!(
            draft.validate(),
            Err(ValidationError::MissingProduct { line: 3 })
        );

        draft.lines[2].product_id = Some(12);
        assert_eq!(draft.validate(), Err(ValidationError::MissingUnit { line: 3 }));
    }

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        let mut draft = valid_draft();
        draft.lines[0].quantity = dec("0");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::NonPositiveQuantity { line: 1 })
        );
        draft.lines[0].quantity = dec("-1.5");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::NonPositiveQuantity { line: 1 })
        );
    }

    #[test]
    fn three_decimal_quantity_is_rejected_when_set_directly() {
        let mut draft = valid_draft();
        draft.lines[1].quantity = dec("2.345");
        assert_eq!(
            draft.validate(),
            Err(ValidationError::TooManyDecimals { line: 2 })
        );
    }

    #[test]
    fn three_decimal_quantity_is_truncated_when_typed() {
        let mut draft = valid_draft();
        draft.set_quantity(0, "2.345").unwrap();
        assert_eq!(draft.lines[0].quantity, dec("2.34"));
        assert!(draft.validate().is_ok());
    }

    #[test]
    fn set_quantity_on_missing_line_fails() {
        let mut draft = valid_draft();
        assert_eq!(
            draft.set_quantity(5, "1"),
            Err(ValidationError::UnknownLine(6))
        );
    }

    #[test]
    fn remove_line_returns_removed_row() {
        let mut draft = valid_draft();
        let removed = draft.remove_line(0).unwrap();
        assert_eq!(removed.product_id, Some(10));
        assert_eq!(draft.lines.len(), 1);
        assert!(draft.remove_line(4).is_err());
    }

    #[test]
    fn draft_from_order_keeps_items_and_area() {
        let order = Order {
            id: 5,
            user_id: 7,
            area_id: 3,
            status: OrderStatus::Process,
            total_amount: dec("6.67"),
            observation: Some("door 2".to_string()),
            created_at: chrono::Utc::now(),
            items: vec![OrderItem {
                product_id: 10,
                quantity: dec("2"),
                price: dec("3.335"),
                unit_measurement_id: 1,
            }],
        };
        let draft = OrderDraft::from_order(&order);
        assert_eq!(draft.area_id, Some(3));
        assert_eq!(draft.status, OrderStatus::Process);
        assert_eq!(draft.lines.len(), 1);
        assert_eq!(draft.total(), dec("6.67"));
    }
}
