//! Parquet encoding of scored sessions.

use std::sync::Arc;

use arrow_array::builder::{Int64Builder, ListBuilder, StringBuilder, StructBuilder};
use arrow_array::{ArrayRef, RecordBatch};
use arrow_schema::{DataType, Field, Fields, Schema, SchemaRef};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;

use chatmetric_core::models::session::ScoredSession;

use crate::error::StorageError;

/// Column names of the results file.
pub mod column {
    pub const SESSION_ID: &str = "session_id";
    pub const CHAT: &str = "chat";
    pub const SCORE: &str = "score";
    pub const ROLE: &str = "role";
    pub const CONTENT: &str = "content";
}

pub const CONTENT_TYPE: &str = "application/vnd.apache.parquet";

fn chat_fields() -> Fields {
    Fields::from(vec![
        Field::new(column::ROLE, DataType::Utf8, false),
        Field::new(column::CONTENT, DataType::Utf8, false),
    ])
}

/// `session_id: Utf8, chat: List<Struct<role, content>>, score: Int64`.
pub fn results_schema() -> SchemaRef {
    let chat_item = Field::new("item", DataType::Struct(chat_fields()), true);
    Arc::new(Schema::new(vec![
        Field::new(column::SESSION_ID, DataType::Utf8, false),
        Field::new(column::CHAT, DataType::List(Arc::new(chat_item)), false),
        Field::new(column::SCORE, DataType::Int64, false),
    ]))
}

/// Encode the whole batch as one Snappy-compressed Parquet file.
///
/// An empty batch produces a valid file with zero rows.
pub fn encode_sessions(sessions: &[ScoredSession]) -> Result<Vec<u8>, StorageError> {
    let schema = results_schema();

    let mut ids = StringBuilder::new();
    let mut scores = Int64Builder::new();
    let mut chat = ListBuilder::new(StructBuilder::from_fields(chat_fields(), 0));

    for session in sessions {
        ids.append_value(&session.session_id);
        scores.append_value(i64::from(session.score));

        let turns = chat.values();
        for turn in &session.chat {
            string_field(turns, 0)?.append_value(turn.role.as_str());
            string_field(turns, 1)?.append_value(&turn.content);
            turns.append(true);
        }
        chat.append(true);
    }

    let columns: Vec<ArrayRef> = vec![
        Arc::new(ids.finish()),
        Arc::new(chat.finish()),
        Arc::new(scores.finish()),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(buf)
}

fn string_field(builder: &mut StructBuilder, i: usize) -> Result<&mut StringBuilder, StorageError> {
    builder
        .field_builder::<StringBuilder>(i)
        .ok_or_else(|| StorageError::Encode(format!("chat field {i} is not a string column")))
}
