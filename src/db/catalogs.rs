//! Reference catalog queries: categories, medicaments, exam types and
//! prescription types, plus the usage counts backing delete guards.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::instrument;

use crate::models::catalog::{
    Category, ExamType, Medicament, PrescriptionType, PrescriptionTypeKind,
};

// ===== Categories =====

pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub sort_order: i64,
    pub active: bool,
}

#[instrument(skip(pool, category), fields(name = %category.name))]
pub async fn insert_category(
    pool: &SqlitePool,
    category: NewCategory,
) -> Result<Category, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO categories (name, description, icon, color, sort_order, active, \
         created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.icon)
    .bind(&category.color)
    .bind(category.sort_order)
    .bind(category.active)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_category(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_category(pool: &SqlitePool, id: i64) -> Result<Option<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>("SELECT * FROM categories WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn category_name_exists(
    pool: &SqlitePool,
    name: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE name = ? AND id != COALESCE(?, -1))",
    )
    .bind(name)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

pub async fn category_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// Active categories in display order.
#[instrument(skip(pool))]
pub async fn list_categories(pool: &SqlitePool) -> Result<Vec<Category>, sqlx::Error> {
    sqlx::query_as::<_, Category>(
        "SELECT * FROM categories WHERE active = 1 ORDER BY sort_order, name",
    )
    .fetch_all(pool)
    .await
}

#[instrument(skip(pool, category), fields(id = category.id))]
pub async fn update_category(pool: &SqlitePool, category: &Category) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE categories SET name = ?, description = ?, icon = ?, color = ?, \
         sort_order = ?, active = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&category.name)
    .bind(&category.description)
    .bind(&category.icon)
    .bind(&category.color)
    .bind(category.sort_order)
    .bind(category.active)
    .bind(Utc::now())
    .bind(category.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Medicaments linked to a category; a non-zero count blocks deletion.
pub async fn category_medicament_count(pool: &SqlitePool, id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM medicaments WHERE category_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[instrument(skip(pool))]
pub async fn delete_category(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM categories WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ===== Medicaments =====

pub struct NewMedicament {
    pub name: String,
    pub description: String,
    pub category_id: i64,
    pub form: Option<String>,
    pub indications: Option<String>,
    pub contraindications: Option<String>,
    pub side_effects: Option<String>,
    pub dosage: Option<String>,
    pub interactions: Option<String>,
    pub available: bool,
}

#[derive(Default)]
pub struct MedicamentFilter {
    pub category_id: Option<i64>,
    pub available: Option<bool>,
}

#[instrument(skip(pool, medicament), fields(name = %medicament.name))]
pub async fn insert_medicament(
    pool: &SqlitePool,
    medicament: NewMedicament,
) -> Result<Medicament, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO medicaments (name, description, category_id, form, indications, \
         contraindications, side_effects, dosage, interactions, available, created_at, \
         updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&medicament.name)
    .bind(&medicament.description)
    .bind(medicament.category_id)
    .bind(&medicament.form)
    .bind(&medicament.indications)
    .bind(&medicament.contraindications)
    .bind(&medicament.side_effects)
    .bind(&medicament.dosage)
    .bind(&medicament.interactions)
    .bind(medicament.available)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_medicament(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_medicament(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Medicament>, sqlx::Error> {
    sqlx::query_as::<_, Medicament>("SELECT * FROM medicaments WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn medicament_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM medicaments WHERE id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

#[instrument(skip(pool, filter))]
pub async fn list_medicaments(
    pool: &SqlitePool,
    filter: MedicamentFilter,
) -> Result<Vec<Medicament>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM medicaments WHERE 1=1");
    if let Some(category_id) = filter.category_id {
        qb.push(" AND category_id = ").push_bind(category_id);
    }
    if let Some(available) = filter.available {
        qb.push(" AND available = ").push_bind(available);
    }
    qb.push(" ORDER BY name");
    qb.build_query_as::<Medicament>().fetch_all(pool).await
}

/// Available medicaments matching the search term on name or description.
#[instrument(skip(pool))]
pub async fn search_medicaments(
    pool: &SqlitePool,
    term: &str,
) -> Result<Vec<Medicament>, sqlx::Error> {
    let pattern = format!("%{}%", term);
    sqlx::query_as::<_, Medicament>(
        "SELECT * FROM medicaments WHERE available = 1 AND (name LIKE ? OR description LIKE ?) \
         ORDER BY name",
    )
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool)
    .await
}

#[instrument(skip(pool, medicament), fields(id = medicament.id))]
pub async fn update_medicament(
    pool: &SqlitePool,
    medicament: &Medicament,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE medicaments SET name = ?, description = ?, category_id = ?, form = ?, \
         indications = ?, contraindications = ?, side_effects = ?, dosage = ?, \
         interactions = ?, available = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&medicament.name)
    .bind(&medicament.description)
    .bind(medicament.category_id)
    .bind(&medicament.form)
    .bind(&medicament.indications)
    .bind(&medicament.contraindications)
    .bind(&medicament.side_effects)
    .bind(&medicament.dosage)
    .bind(&medicament.interactions)
    .bind(medicament.available)
    .bind(Utc::now())
    .bind(medicament.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Prescriptions and treatments referencing the medicament.
pub async fn medicament_usage_count(pool: &SqlitePool, id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT (SELECT COUNT(*) FROM prescriptions WHERE medicament_id = ?) \
              + (SELECT COUNT(*) FROM treatments WHERE medicament_id = ?)",
    )
    .bind(id)
    .bind(id)
    .fetch_one(pool)
    .await?;
    Ok(count)
}

#[instrument(skip(pool))]
pub async fn delete_medicament(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM medicaments WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ===== Exam types =====

pub struct NewExamType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub urgent_possible: bool,
    pub available: bool,
    pub sort_order: i64,
}

#[instrument(skip(pool, exam_type), fields(code = %exam_type.code))]
pub async fn insert_exam_type(
    pool: &SqlitePool,
    exam_type: NewExamType,
) -> Result<ExamType, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO exam_types (code, name, description, category, urgent_possible, \
         available, sort_order, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&exam_type.code)
    .bind(&exam_type.name)
    .bind(&exam_type.description)
    .bind(&exam_type.category)
    .bind(exam_type.urgent_possible)
    .bind(exam_type.available)
    .bind(exam_type.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_exam_type(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_exam_type(pool: &SqlitePool, id: i64) -> Result<Option<ExamType>, sqlx::Error> {
    sqlx::query_as::<_, ExamType>("SELECT * FROM exam_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn exam_type_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM exam_types WHERE id = ?)")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

pub async fn exam_type_code_exists(
    pool: &SqlitePool,
    code: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM exam_types WHERE code = ? AND id != COALESCE(?, -1))",
    )
    .bind(code)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[instrument(skip(pool))]
pub async fn list_exam_types(
    pool: &SqlitePool,
    category: Option<String>,
) -> Result<Vec<ExamType>, sqlx::Error> {
    let mut qb = QueryBuilder::<Sqlite>::new("SELECT * FROM exam_types WHERE available = 1");
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category);
    }
    qb.push(" ORDER BY sort_order, name");
    qb.build_query_as::<ExamType>().fetch_all(pool).await
}

#[instrument(skip(pool, exam_type), fields(id = exam_type.id))]
pub async fn update_exam_type(pool: &SqlitePool, exam_type: &ExamType) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE exam_types SET code = ?, name = ?, description = ?, category = ?, \
         urgent_possible = ?, available = ?, sort_order = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&exam_type.code)
    .bind(&exam_type.name)
    .bind(&exam_type.description)
    .bind(&exam_type.category)
    .bind(exam_type.urgent_possible)
    .bind(exam_type.available)
    .bind(exam_type.sort_order)
    .bind(Utc::now())
    .bind(exam_type.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn exam_type_usage_count(pool: &SqlitePool, id: i64) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM exams WHERE exam_type_id = ?")
        .bind(id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[instrument(skip(pool))]
pub async fn delete_exam_type(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM exam_types WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}

// ===== Prescription types =====

pub struct NewPrescriptionType {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    pub kind: PrescriptionTypeKind,
    pub unit_price: f64,
    pub renewable: bool,
    pub available: bool,
    pub sort_order: i64,
}

#[instrument(skip(pool, ptype), fields(code = %ptype.code))]
pub async fn insert_prescription_type(
    pool: &SqlitePool,
    ptype: NewPrescriptionType,
) -> Result<PrescriptionType, sqlx::Error> {
    let now = Utc::now();
    let result = sqlx::query(
        "INSERT INTO prescription_types (code, name, description, category, kind, \
         unit_price, renewable, available, sort_order, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&ptype.code)
    .bind(&ptype.name)
    .bind(&ptype.description)
    .bind(&ptype.category)
    .bind(ptype.kind)
    .bind(ptype.unit_price)
    .bind(ptype.renewable)
    .bind(ptype.available)
    .bind(ptype.sort_order)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    find_prescription_type(pool, result.last_insert_rowid())
        .await?
        .ok_or(sqlx::Error::RowNotFound)
}

pub async fn find_prescription_type(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<PrescriptionType>, sqlx::Error> {
    sqlx::query_as::<_, PrescriptionType>("SELECT * FROM prescription_types WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn prescription_type_exists(pool: &SqlitePool, id: i64) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS(SELECT 1 FROM prescription_types WHERE id = ?)")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(exists)
}

pub async fn prescription_type_code_exists(
    pool: &SqlitePool,
    code: &str,
    exclude_id: Option<i64>,
) -> Result<bool, sqlx::Error> {
    let (exists,): (bool,) = sqlx::query_as(
        "SELECT EXISTS(SELECT 1 FROM prescription_types WHERE code = ? AND id != COALESCE(?, -1))",
    )
    .bind(code)
    .bind(exclude_id)
    .fetch_one(pool)
    .await?;
    Ok(exists)
}

#[instrument(skip(pool))]
pub async fn list_prescription_types(
    pool: &SqlitePool,
    category: Option<String>,
    kind: Option<PrescriptionTypeKind>,
) -> Result<Vec<PrescriptionType>, sqlx::Error> {
    let mut qb =
        QueryBuilder::<Sqlite>::new("SELECT * FROM prescription_types WHERE available = 1");
    if let Some(category) = category {
        qb.push(" AND category = ").push_bind(category);
    }
    if let Some(kind) = kind {
        qb.push(" AND kind = ").push_bind(kind);
    }
    qb.push(" ORDER BY sort_order, name");
    qb.build_query_as::<PrescriptionType>().fetch_all(pool).await
}

#[instrument(skip(pool, ptype), fields(id = ptype.id))]
pub async fn update_prescription_type(
    pool: &SqlitePool,
    ptype: &PrescriptionType,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE prescription_types SET code = ?, name = ?, description = ?, category = ?, \
         kind = ?, unit_price = ?, renewable = ?, available = ?, sort_order = ?, \
         updated_at = ? WHERE id = ?",
    )
    .bind(&ptype.code)
    .bind(&ptype.name)
    .bind(&ptype.description)
    .bind(&ptype.category)
    .bind(ptype.kind)
    .bind(ptype.unit_price)
    .bind(ptype.renewable)
    .bind(ptype.available)
    .bind(ptype.sort_order)
    .bind(Utc::now())
    .bind(ptype.id)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn prescription_type_usage_count(
    pool: &SqlitePool,
    id: i64,
) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM prescriptions WHERE prescription_type_id = ?")
            .bind(id)
            .fetch_one(pool)
            .await?;
    Ok(count)
}

#[instrument(skip(pool))]
pub async fn delete_prescription_type(pool: &SqlitePool, id: i64) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM prescription_types WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(())
}
