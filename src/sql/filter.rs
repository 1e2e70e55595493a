//! Where filters and column setters. Values never reach SQL text; they are
//! carried alongside and bound as parameters.

use crate::error::PredicateError;
use crate::schema::{FieldType, FieldValue, SchemaFieldReference};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {
    Equal,
    NotEqual,
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,
    Like,
    NotLike,
    ILike,
    NotILike,
    In,
    NotIn,
    IsNull,
    IsNotNull,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Arity {
    Unary,
    Binary,
    List,
}

impl Operator {
    pub fn as_sql(self) -> &'static str {
        match self {
            Operator::Equal => "=",
            Operator::NotEqual => "<>",
            Operator::GreaterThan => ">",
            Operator::LessThan => "<",
            Operator::GreaterThanOrEqual => ">=",
            Operator::LessThanOrEqual => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::ILike => "ILIKE",
            Operator::NotILike => "NOT ILIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }

    pub(crate) fn arity(self) -> Arity {
        match self {
            Operator::IsNull | Operator::IsNotNull => Arity::Unary,
            Operator::In | Operator::NotIn => Arity::List,
            _ => Arity::Binary,
        }
    }

    /// Pattern operators only apply to text.
    pub fn is_pattern(self) -> bool {
        matches!(
            self,
            Operator::Like | Operator::NotLike | Operator::ILike | Operator::NotILike
        )
    }
}

/// Right-hand side of a filter.
#[derive(Clone, Debug, PartialEq)]
pub enum Operand {
    None,
    One(FieldValue),
    Many(Vec<FieldValue>),
}

/// A single typed comparison: `<field> <operator> <operand>`.
#[derive(Clone, Debug, PartialEq)]
pub struct WhereFilter {
    field: SchemaFieldReference,
    operator: Operator,
    operand: Operand,
    text_cast: bool,
}

impl WhereFilter {
    pub fn new(field: &SchemaFieldReference, operator: Operator, value: impl Into<FieldValue>) -> Self {
        WhereFilter {
            field: field.clone(),
            operator,
            operand: Operand::One(value.into()),
            text_cast: false,
        }
    }

    pub fn equals(field: &SchemaFieldReference, value: impl Into<FieldValue>) -> Self {
        Self::new(field, Operator::Equal, value)
    }

    pub fn is_null(field: &SchemaFieldReference) -> Self {
        Self::unary(field, Operator::IsNull)
    }

    pub fn is_not_null(field: &SchemaFieldReference) -> Self {
        Self::unary(field, Operator::IsNotNull)
    }

    pub fn in_list<V: Into<FieldValue>>(field: &SchemaFieldReference, values: impl IntoIterator<Item = V>) -> Self {
        Self::list(field, Operator::In, values)
    }

    pub fn not_in<V: Into<FieldValue>>(field: &SchemaFieldReference, values: impl IntoIterator<Item = V>) -> Self {
        Self::list(field, Operator::NotIn, values)
    }

    fn unary(field: &SchemaFieldReference, operator: Operator) -> Self {
        WhereFilter {
            field: field.clone(),
            operator,
            operand: Operand::None,
            text_cast: false,
        }
    }

    fn list<V: Into<FieldValue>>(
        field: &SchemaFieldReference,
        operator: Operator,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        WhereFilter {
            field: field.clone(),
            operator,
            operand: Operand::Many(values.into_iter().map(Into::into).collect()),
            text_cast: false,
        }
    }

    /// Compare the column's text form (`field::text`); operands must be strings.
    pub fn cast_to_text(mut self) -> Self {
        self.text_cast = true;
        self
    }

    pub fn field(&self) -> &SchemaFieldReference {
        &self.field
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn operand(&self) -> &Operand {
        &self.operand
    }

    /// True when the column is rendered and compared as text: requested
    /// explicitly, or a pattern operator against a non-text column.
    pub fn compares_as_text(&self) -> bool {
        self.text_cast || (self.operator.is_pattern() && !self.field.field_type().is_textual())
    }

    /// Type the operand values are bound as.
    pub fn operand_type(&self) -> FieldType {
        if self.compares_as_text() {
            FieldType::String
        } else {
            self.field.field_type()
        }
    }

    /// Operand shape must fit the operator. Value types are checked at bind time.
    pub(crate) fn validate(&self) -> Result<(), PredicateError> {
        let invalid = |reason: &str| PredicateError::InvalidOperand {
            field: self.field.name().to_string(),
            operator: self.operator.as_sql(),
            reason: reason.to_string(),
        };
        match (self.operator.arity(), &self.operand) {
            (Arity::Unary, Operand::None) => Ok(()),
            (Arity::Unary, _) => Err(invalid("takes no value")),
            (Arity::Binary, Operand::One(v)) if v.is_null() => {
                Err(invalid("null value; use IS NULL / IS NOT NULL"))
            }
            (Arity::Binary, Operand::One(_)) => Ok(()),
            (Arity::Binary, _) => Err(invalid("takes exactly one value")),
            (Arity::List, Operand::Many(values)) if values.is_empty() => Err(invalid("empty list")),
            (Arity::List, Operand::Many(values)) if values.iter().any(FieldValue::is_null) => {
                Err(invalid("null in list"))
            }
            (Arity::List, Operand::Many(_)) => Ok(()),
            (Arity::List, _) => Err(invalid("takes a list of values")),
        }
    }
}

/// `column = <value>` in an UPDATE SET clause or an INSERT column list.
#[derive(Clone, Debug, PartialEq)]
pub struct ColumnSetter {
    column: String,
    field_type: Option<FieldType>,
    value: FieldValue,
}

impl ColumnSetter {
    /// Type tag inferred from the value. An untyped NULL renders as a `NULL`
    /// literal instead of a parameter.
    pub fn new(column: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        let value = value.into();
        ColumnSetter {
            column: column.into(),
            field_type: value.field_type(),
            value,
        }
    }

    pub fn typed(column: impl Into<String>, field_type: FieldType, value: impl Into<FieldValue>) -> Self {
        ColumnSetter {
            column: column.into(),
            field_type: Some(field_type),
            value: value.into(),
        }
    }

    pub fn null(column: impl Into<String>, field_type: FieldType) -> Self {
        Self::typed(column, field_type, FieldValue::Null)
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    pub fn field_type(&self) -> Option<FieldType> {
        self.field_type
    }

    pub fn value(&self) -> &FieldValue {
        &self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ID: SchemaFieldReference = SchemaFieldReference::new("id", FieldType::Integer, &[]);
    const NAME: SchemaFieldReference = SchemaFieldReference::new("name", FieldType::String, &[]);

    #[test]
    fn unary_rejects_value() {
        let mut f = WhereFilter::is_null(&NAME);
        assert!(f.validate().is_ok());
        f.operand = Operand::One("x".into());
        assert!(f.validate().is_err());
    }

    #[test]
    fn binary_rejects_null_value() {
        let f = WhereFilter::equals(&NAME, None::<String>);
        assert!(matches!(
            f.validate(),
            Err(PredicateError::InvalidOperand { operator: "=", .. })
        ));
    }

    #[test]
    fn in_rejects_empty_list() {
        let f = WhereFilter::in_list(&ID, Vec::<i32>::new());
        assert!(f.validate().is_err());
        assert!(WhereFilter::in_list(&ID, [1, 2]).validate().is_ok());
    }

    #[test]
    fn like_on_integer_compares_as_text() {
        let f = WhereFilter::new(&ID, Operator::Like, "1%");
        assert!(f.compares_as_text());
        assert_eq!(f.operand_type(), FieldType::String);
        assert!(!WhereFilter::new(&NAME, Operator::Like, "j%").compares_as_text());
        assert!(WhereFilter::equals(&ID, "3").cast_to_text().compares_as_text());
    }

    #[test]
    fn setter_infers_type_from_value() {
        assert_eq!(ColumnSetter::new("name", "joe").field_type(), Some(FieldType::String));
        assert_eq!(ColumnSetter::new("name", None::<String>).field_type(), None);
        assert_eq!(
            ColumnSetter::null("age", FieldType::Integer).field_type(),
            Some(FieldType::Integer)
        );
    }
}
