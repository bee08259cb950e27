use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

pub const UNITS_TABLE: &str = "units";

pub fn build_units_schema(dim: i32) -> Arc<Schema> {
	Arc::new(Schema::new(vec![
		Field::new("unit_id", DataType::Int64, false),
		Field::new("source_id", DataType::Utf8, false),
		Field::new("sequence_index", DataType::Int32, false),
		Field::new("text", DataType::Utf8, false),
		Field::new("vector", DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim), true),
	]))
}
