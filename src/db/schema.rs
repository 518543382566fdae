//! Schema initialization.
//!
//! Tables are created on startup if they do not exist. Enumerated columns
//! are stored as snake_case TEXT matching the Rust enum wire values.

use sqlx::SqlitePool;

pub async fn initialize(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await?;

    // Patients table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            last_name TEXT,
            email TEXT UNIQUE,
            phone TEXT NOT NULL UNIQUE,
            pin_hash TEXT NOT NULL,
            password_hash TEXT NOT NULL,
            gender TEXT,
            birth_date TEXT,
            height REAL,
            weight REAL,
            blood_type TEXT,
            asthma_severity TEXT NOT NULL DEFAULT 'moderate',
            allergies TEXT,
            medical_history TEXT,
            current_medications TEXT,
            medical_notes TEXT,
            emergency_contact_name TEXT,
            emergency_contact_phone TEXT,
            emergency_contact_relationship TEXT,
            attending_doctor TEXT,
            attending_doctor_phone TEXT,
            asthma_specialist TEXT,
            asthma_specialist_phone TEXT,
            emergency_hospital TEXT,
            follow_up_hospital TEXT,
            insurance_number TEXT,
            phone_verified BOOLEAN NOT NULL DEFAULT 0,
            is_active_patient BOOLEAN NOT NULL DEFAULT 1,
            registration_date TEXT NOT NULL,
            pin_created_at TEXT NOT NULL,
            last_login_at TEXT,
            login_attempts INTEGER NOT NULL DEFAULT 0,
            locked_until TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Bearer token store
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS access_tokens (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            token TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL,
            last_used_at TEXT,
            FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // Crises table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS crises (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            started_at TEXT NOT NULL,
            ended_at TEXT,
            intensity TEXT NOT NULL DEFAULT 'moderate',
            symptoms TEXT NOT NULL,
            triggers TEXT,
            treatments_used TEXT,
            notes TEXT,
            status TEXT NOT NULL DEFAULT 'ongoing',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE
        )",
    )
    .execute(pool)
    .await?;

    // Hospitalizations table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS hospitalizations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            crisis_id INTEGER,
            reason TEXT NOT NULL,
            department TEXT,
            attending_doctor TEXT,
            diagnosis TEXT,
            start_date TEXT NOT NULL,
            end_date TEXT,
            status TEXT NOT NULL DEFAULT 'ongoing',
            severity TEXT NOT NULL,
            intensive_care BOOLEAN NOT NULL DEFAULT 0,
            room_number TEXT,
            discharge_notes TEXT,
            observations TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE,
            FOREIGN KEY (crisis_id) REFERENCES crises(id) ON DELETE SET NULL
        )",
    )
    .execute(pool)
    .await?;

    // Medicament categories
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            description TEXT,
            icon TEXT,
            color TEXT,
            sort_order INTEGER NOT NULL DEFAULT 0,
            active BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Medicaments table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS medicaments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            category_id INTEGER NOT NULL,
            form TEXT,
            indications TEXT,
            contraindications TEXT,
            side_effects TEXT,
            dosage TEXT,
            interactions TEXT,
            available BOOLEAN NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (category_id) REFERENCES categories(id)
        )",
    )
    .execute(pool)
    .await?;

    // Exam type catalog
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS exam_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL,
            urgent_possible BOOLEAN NOT NULL DEFAULT 0,
            available BOOLEAN NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Prescription type catalog
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS prescription_types (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            code TEXT NOT NULL UNIQUE,
            name TEXT NOT NULL,
            description TEXT,
            category TEXT NOT NULL,
            kind TEXT NOT NULL,
            unit_price REAL NOT NULL DEFAULT 0,
            renewable BOOLEAN NOT NULL DEFAULT 0,
            available BOOLEAN NOT NULL DEFAULT 1,
            sort_order INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Prescriptions table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS prescriptions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            hospitalization_id INTEGER,
            medicament_id INTEGER,
            prescription_type_id INTEGER NOT NULL,
            prescribing_doctor TEXT NOT NULL,
            prescribed_on TEXT NOT NULL,
            start_date TEXT,
            end_date TEXT,
            dosage TEXT NOT NULL,
            frequency TEXT NOT NULL,
            instructions TEXT,
            status TEXT NOT NULL DEFAULT 'active',
            suspension_reason TEXT,
            observations TEXT,
            quantity INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE,
            FOREIGN KEY (hospitalization_id) REFERENCES hospitalizations(id) ON DELETE CASCADE,
            FOREIGN KEY (medicament_id) REFERENCES medicaments(id),
            FOREIGN KEY (prescription_type_id) REFERENCES prescription_types(id)
        )",
    )
    .execute(pool)
    .await?;

    // Exams table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS exams (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            hospitalization_id INTEGER,
            exam_type_id INTEGER NOT NULL,
            exam_date TEXT NOT NULL,
            result_date TEXT,
            status TEXT NOT NULL DEFAULT 'scheduled',
            urgent BOOLEAN NOT NULL DEFAULT 0,
            results TEXT,
            interpretation TEXT,
            prescribing_doctor TEXT,
            performing_technician TEXT,
            observations TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE,
            FOREIGN KEY (hospitalization_id) REFERENCES hospitalizations(id) ON DELETE CASCADE,
            FOREIGN KEY (exam_type_id) REFERENCES exam_types(id)
        )",
    )
    .execute(pool)
    .await?;

    // Treatments table
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS treatments (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            patient_id INTEGER NOT NULL,
            medicament_id INTEGER NOT NULL,
            dosage TEXT NOT NULL,
            frequency TEXT NOT NULL,
            kind TEXT NOT NULL DEFAULT 'preventive',
            start_date TEXT NOT NULL,
            end_date TEXT,
            active BOOLEAN NOT NULL DEFAULT 1,
            side_effects TEXT,
            instructions TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (patient_id) REFERENCES patients(id) ON DELETE CASCADE,
            FOREIGN KEY (medicament_id) REFERENCES medicaments(id)
        )",
    )
    .execute(pool)
    .await?;

    Ok(())
}
