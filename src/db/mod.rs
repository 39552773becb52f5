// Database access layer (SQLite via sqlx): case history and mock payments.

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CaseRecord {
    pub id: i64,
    pub description: String,
    pub verdict: String,
    pub confidence: f64,
    /// Full verdict payload as JSON text.
    pub payload: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: i64,
    pub payment_id: String,
    pub amount: f64,
    pub currency: String,
    pub payment_method: String,
    pub file_name: String,
    pub duration: f64,
    pub status: String,
    pub created_at: String,
}

/// Fields of a payment before it is stored.
#[derive(Debug, Clone)]
pub struct NewPayment<'a> {
    pub payment_id: &'a str,
    pub amount: f64,
    pub currency: &'a str,
    pub payment_method: &'a str,
    pub file_name: &'a str,
    pub duration: f64,
}

pub struct Database {
    pool: SqlitePool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        // every in-memory connection is a separate database
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        let db = Self { pool };
        db.run_migrations().await?;
        Ok(db)
    }

    async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cases (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                description TEXT NOT NULL,
                verdict TEXT NOT NULL,
                confidence REAL NOT NULL,
                payload TEXT NOT NULL DEFAULT '{}',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS payments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                payment_id TEXT NOT NULL UNIQUE,
                amount REAL NOT NULL,
                currency TEXT NOT NULL,
                payment_method TEXT NOT NULL,
                file_name TEXT NOT NULL DEFAULT '',
                duration REAL NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'completed',
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            )
        "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ── Cases ─────────────────────────────────────────────────────────

    pub async fn create_case(
        &self,
        description: &str,
        verdict: &str,
        confidence: f64,
        payload: &str,
    ) -> Result<CaseRecord, sqlx::Error> {
        let row = sqlx::query_as::<_, CaseRecord>(
            "INSERT INTO cases (description, verdict, confidence, payload) VALUES (?, ?, ?, ?) \
             RETURNING id, description, verdict, confidence, payload, created_at",
        )
        .bind(description)
        .bind(verdict)
        .bind(confidence)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    /// Most recent cases first.
    pub async fn list_cases(&self, limit: i64, offset: i64) -> Result<Vec<CaseRecord>, sqlx::Error> {
        let rows = sqlx::query_as::<_, CaseRecord>(
            "SELECT id, description, verdict, confidence, payload, created_at FROM cases \
             ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn get_case(&self, id: i64) -> Result<Option<CaseRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, CaseRecord>(
            "SELECT id, description, verdict, confidence, payload, created_at FROM cases WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn delete_case(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM cases WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // ── Payments ──────────────────────────────────────────────────────

    pub async fn create_payment(&self, payment: &NewPayment<'_>) -> Result<PaymentRecord, sqlx::Error> {
        let row = sqlx::query_as::<_, PaymentRecord>(
            "INSERT INTO payments (payment_id, amount, currency, payment_method, file_name, duration) \
             VALUES (?, ?, ?, ?, ?, ?) \
             RETURNING id, payment_id, amount, currency, payment_method, file_name, duration, status, created_at",
        )
        .bind(payment.payment_id)
        .bind(payment.amount)
        .bind(payment.currency)
        .bind(payment.payment_method)
        .bind(payment.file_name)
        .bind(payment.duration)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_payment(&self, payment_id: &str) -> Result<Option<PaymentRecord>, sqlx::Error> {
        let row = sqlx::query_as::<_, PaymentRecord>(
            "SELECT id, payment_id, amount, currency, payment_method, file_name, duration, status, created_at \
             FROM payments WHERE payment_id = ?",
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        Database::new("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn test_case_crud() {
        let db = test_db().await;

        let case = db
            .create_case("정글이 갱을 안 왔어요", "부분 유죄", 0.8, r#"{"verdict":"부분 유죄"}"#)
            .await
            .unwrap();
        assert_eq!(case.verdict, "부분 유죄");
        assert_eq!(case.confidence, 0.8);

        let fetched = db.get_case(case.id).await.unwrap().unwrap();
        assert_eq!(fetched.description, "정글이 갱을 안 왔어요");

        assert!(db.delete_case(case.id).await.unwrap());
        assert!(!db.delete_case(case.id).await.unwrap());
        assert!(db.get_case(case.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_cases_newest_first() {
        let db = test_db().await;
        for i in 0..5 {
            db.create_case(&format!("case {i}"), "무죄", 0.8, "{}").await.unwrap();
        }

        let page = db.list_cases(2, 0).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].description, "case 4");
        assert_eq!(page[1].description, "case 3");

        let rest = db.list_cases(10, 2).await.unwrap();
        assert_eq!(rest.len(), 3);
    }

    #[tokio::test]
    async fn test_payment_roundtrip() {
        let db = test_db().await;
        let payment = db
            .create_payment(&NewPayment {
                payment_id: "pay-1",
                amount: 0.09,
                currency: "USD",
                payment_method: "card",
                file_name: "match.rofl",
                duration: 120.0,
            })
            .await
            .unwrap();
        assert_eq!(payment.status, "completed");

        let fetched = db.get_payment("pay-1").await.unwrap().unwrap();
        assert_eq!(fetched.file_name, "match.rofl");
        assert!(db.get_payment("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_payment_id_rejected() {
        let db = test_db().await;
        let payment = NewPayment {
            payment_id: "dup",
            amount: 1.0,
            currency: "USD",
            payment_method: "card",
            file_name: "",
            duration: 0.0,
        };
        db.create_payment(&payment).await.unwrap();
        assert!(db.create_payment(&payment).await.is_err());
    }
}
