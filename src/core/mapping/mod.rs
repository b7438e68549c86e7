//! Field mapping engine
//!
//! Deterministically transforms one reconciled invoice (analytical row +
//! optional clinical record + glosa reference) into the two fixed-column
//! output lines. Line 1 carries 102 positional fields, line 2 carries 9;
//! both counts are hard invariants checked after assembly.

pub mod normalize;
pub mod sanitize;

use crate::adapters::sql::SqlRow;
use crate::domain::{ClinicalRecord, ExportError, GlosaRef, InvoiceId, Result};
use normalize::*;
use sanitize::sanitize_field;

/// Fixed field count of the FURIPS1 line format
pub const LINE1_FIELD_COUNT: usize = 102;
/// Fixed field count of the FURIPS2 line format
pub const LINE2_FIELD_COUNT: usize = 9;
/// Reporting institution NIT; also the constant prefix of the file-name
/// suffix.
pub const REPORTING_NIT: &str = "540010227201";

/// Both rendered lines for one invoice
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLines {
    pub line1: String,
    pub line2: String,
}

/// One person's identity block. Owner, driver and victim blocks are built
/// independently; the victim block may then replace owner and/or driver
/// wholesale.
#[derive(Debug, Clone, Default)]
struct Identity {
    surname1: String,
    surname2: String,
    given_name1: String,
    given_name2: String,
    doc_type: String,
    document: String,
    address: String,
    phone: String,
    department: String,
    municipality: String,
}

/// Victim identity carries two extra demographic fields only the victim
/// block emits.
#[derive(Debug, Clone, Default)]
struct Victim {
    identity: Identity,
    birth_date: String,
    sex: String,
}

/// Render both output lines for one invoice.
///
/// Pure with respect to its inputs: all store lookups (enrichment row,
/// clinical record, glosa reference) happen before this call.
pub fn build_lines(
    invoice: &InvoiceId,
    row: &SqlRow,
    clinical: Option<&ClinicalRecord>,
    glosa: &GlosaRef,
) -> Result<OutputLines> {
    let line1 = build_line1(invoice, row, clinical, glosa)?;
    let line2 = build_line2(invoice, row, clinical)?;
    Ok(OutputLines { line1, line2 })
}

fn build_line1(
    invoice: &InvoiceId,
    row: &SqlRow,
    clinical: Option<&ClinicalRecord>,
    glosa: &GlosaRef,
) -> Result<String> {
    let state = normalize_insurance_state(row.get("ESTADO_ASEGURAMIENTO"));
    let ghost_vehicle = state == "3";
    let policy_applies = matches!(state, "1" | "4" | "6");

    // Ghost/fled vehicles carry no service type, brand or insurer code.
    let service_type = if ghost_vehicle {
        String::new()
    } else {
        row.get("TIPO_SERVICIO").to_string()
    };
    let brand = if ghost_vehicle {
        String::new()
    } else {
        row.get("MARCA").to_string()
    };
    let insurer_code = if ghost_vehicle {
        String::new()
    } else {
        row.get("CODIGO_ASEGURADORA").to_string()
    };
    let (policy_number, valid_from, valid_until) = if policy_applies {
        (
            row.get("NUMERO_POLIZA").to_string(),
            format_date(row.get("VIGENCIA_POLIZA_DESDE")),
            format_date(row.get("VIGENCIA_POLIZA_HASTA")),
        )
    } else {
        (String::new(), String::new(), String::new())
    };

    let victim = victim_block(row, clinical);
    let mut owner = owner_block(row);
    let mut driver = driver_block(row);
    // The substitution happens after all three blocks exist; the flags mark
    // "this role is the victim".
    if is_affirmative(row.get("VICTIMA_PROPIETARIO")) {
        owner = victim.identity.clone();
    }
    if is_affirmative(row.get("VICTIMA_CONDUCTOR")) {
        driver = victim.identity.clone();
    }

    let accident_department = row.get("COD_DEPTO").to_string();
    let accident_municipality = municipality_mid(row.get("COD_MUNICIPIO"));

    let diagnosis = clinical
        .and_then(|c| non_empty(&c.diagnosis_code))
        .unwrap_or_else(|| row.get("COD_DIAGNOSTICO").to_string());
    // The legacy data never carries a distinct secondary diagnosis.
    let diagnosis_secondary = diagnosis.clone();

    let accident_date = format_date(row.get("FECHA_ACCIDENTE"));
    let accident_time = clock_prefix(row.get("HORA_ACCIDENTE"));
    let admission_date = clinical
        .and_then(|c| non_empty(&c.admission_date))
        .unwrap_or_else(|| format_date(row.get("FECHASER")));
    let admission_time = clinical
        .and_then(|c| non_empty(&c.admission_time))
        .unwrap_or_else(|| clock_prefix(row.get("HORASER")));
    let discharge_date = clinical
        .and_then(|c| non_empty(&c.discharge_date))
        .unwrap_or_else(|| admission_date.clone());
    let discharge_time = clinical
        .and_then(|c| non_empty(&c.discharge_time))
        .unwrap_or_else(|| shift_discharge_time(&admission_time));

    let physician_surnames = clinical.map(|c| c.physician_surnames.as_str()).unwrap_or("");
    let physician_givens = clinical
        .map(|c| c.physician_given_names.as_str())
        .unwrap_or("");
    let physician_surname1 = extract_word(physician_surnames, 0);
    let physician_surname2 = extract_word(physician_surnames, 1);
    let physician_given1 = extract_word(physician_givens, 0);
    let physician_given2 = extract_word(physician_givens, 1);
    let physician_document = clinical
        .map(|c| c.physician_document.clone())
        .unwrap_or_default();
    let physician_registry = clinical
        .map(|c| c.physician_registry.clone())
        .unwrap_or_default();

    let total_billed = total_billed(row, clinical);

    let surcharge = if row.get("COBRO_EXCEDENTE") == "SI" {
        "1"
    } else {
        "0"
    };

    let transfer_zone = row.get_non_empty("ZONA_TRASLADOS").unwrap_or("U");

    let fields: Vec<String> = vec![
        glosa.number.clone(),                               // 1 glosa number
        glosa.response.clone(),                             // 2 glosa response
        invoice.as_str().to_string(),                       // 3 invoice number
        invoice.consecutive(),                              // 4 consecutive
        REPORTING_NIT.to_string(),                          // 5 reporting NIT
        victim.identity.surname1.clone(),                   // 6 victim surname 1
        victim.identity.surname2.clone(),                   // 7 victim surname 2
        victim.identity.given_name1.clone(),                // 8 victim given name 1
        victim.identity.given_name2.clone(),                // 9 victim given name 2
        victim.identity.doc_type.clone(),                   // 10 victim doc type
        victim.identity.document.clone(),                   // 11 victim document
        victim.birth_date.clone(),                          // 12 victim birth date
        String::new(),                                      // 13 reserved
        victim.sex.clone(),                                 // 14 victim sex
        strip_commas(&victim.identity.address),             // 15 victim address
        victim.identity.department.clone(),                 // 16 victim department
        victim.identity.municipality.clone(),               // 17 victim municipality
        victim.identity.phone.clone(),                      // 18 victim phone
        normalize_condition(row.get("CONDICION_ACCIDENTADO")).to_string(), // 19 condition
        "01".to_string(),                                   // 20 event nature
        String::new(),                                      // 21 other nature
        strip_commas(row.get("DIRECCION_OCURRENCIA")),      // 22 occurrence address
        accident_date,                                      // 23 accident date
        accident_time,                                      // 24 accident time
        accident_department,                                // 25 accident department
        accident_municipality,                              // 26 accident municipality
        row.get("ZONA").to_string(),                        // 27 zone
        state.to_string(),                                  // 28 insurance state
        brand,                                              // 29 vehicle brand
        row.get("PLACA").to_string(),                       // 30 plate
        service_type,                                       // 31 service type
        insurer_code,                                       // 32 insurer code
        policy_number,                                      // 33 policy number
        valid_from,                                         // 34 policy valid from
        valid_until,                                        // 35 policy valid until
        row.get("CODIFICACION_SIRAS").to_string(),          // 36 SIRAS coding
        surcharge.to_string(),                              // 37 surcharge billed
        diagnosis.clone(),                                  // 38 diagnosis
        String::new(),                                      // 39 reserved
        String::new(),                                      // 40 reserved
        String::new(),                                      // 41 reserved
        String::new(),                                      // 42 reserved
        String::new(),                                      // 43 reserved
        driver.doc_type.clone(),                            // 44 driver doc type
        driver.document.clone(),                            // 45 driver document
        driver.surname1.clone(),                            // 46 driver surname 1
        driver.surname2.clone(),                            // 47 driver surname 2
        driver.given_name1.clone(),                         // 48 driver given name 1
        driver.given_name2.clone(),                         // 49 driver given name 2
        strip_commas(&driver.address),                      // 50 driver address
        driver.phone.clone(),                               // 51 driver phone
        driver.department.clone(),                          // 52 driver department
        driver.municipality.clone(),                        // 53 driver municipality
        owner.surname1.clone(),                             // 54 owner surname 1
        owner.surname2.clone(),                             // 55 owner surname 2
        owner.given_name1.clone(),                          // 56 owner given name 1
        owner.given_name2.clone(),                          // 57 owner given name 2
        owner.doc_type.clone(),                             // 58 owner doc type
        owner.document.clone(),                             // 59 owner document
        strip_commas(&owner.address),                       // 60 owner address
        owner.department.clone(),                           // 61 owner department
        owner.municipality.clone(),                         // 62 owner municipality
        owner.phone.clone(),                                // 63 owner phone
        String::new(),                                      // 64 reserved
        String::new(),                                      // 65 reserved
        String::new(),                                      // 66 reserved
        String::new(),                                      // 67 reserved
        String::new(),                                      // 68 reserved
        String::new(),                                      // 69 reserved
        String::new(),                                      // 70 reserved
        String::new(),                                      // 71 reserved
        String::new(),                                      // 72 reserved
        String::new(),                                      // 73 reserved
        String::new(),                                      // 74 reserved
        row.get("PLACA_AMB").to_string(),                   // 75 ambulance plate
        truncate_chars(row.get("DESDE"), 40),               // 76 transfer origin
        truncate_chars(row.get("HASTA"), 40),               // 77 transfer destination
        "1".to_string(),                                    // 78 medicalized transfer
        transfer_zone.to_string(),                          // 79 transfer zone
        admission_date,                                     // 80 admission date
        admission_time,                                     // 81 admission time
        discharge_date,                                     // 82 discharge date
        discharge_time,                                     // 83 discharge time
        diagnosis,                                          // 84 principal diagnosis
        String::new(),                                      // 85 reserved
        String::new(),                                      // 86 reserved
        diagnosis_secondary,                                // 87 secondary diagnosis
        String::new(),                                      // 88 reserved
        String::new(),                                      // 89 reserved
        physician_surname1,                                 // 90 physician surname 1
        physician_surname2,                                 // 91 physician surname 2
        physician_given1,                                   // 92 physician given name 1
        physician_given2,                                   // 93 physician given name 2
        "CC".to_string(),                                   // 94 physician doc type
        physician_document,                                 // 95 physician document
        physician_registry,                                 // 96 physician registry
        total_billed.clone(),                               // 97 total billed
        total_billed.clone(),                               // 98 total claimed
        "0".to_string(),                                    // 99 copayment
        total_billed,                                       // 100 deductible
        "1".to_string(),                                    // 101 signed
        row.get("DESCRIPCION_ACCIDENTE").to_string(),       // 102 accident description
    ];

    finish_line("FURIPS1", invoice, fields, LINE1_FIELD_COUNT)
}

fn build_line2(
    invoice: &InvoiceId,
    row: &SqlRow,
    clinical: Option<&ClinicalRecord>,
) -> Result<String> {
    let service_source = clinical
        .and_then(|c| non_empty(&c.service))
        .unwrap_or_else(|| row.get("TIPO_SERVICIO").to_string());
    let (service_code, service_description) = split_service(&service_source);

    let quantity = normalize_quantity(
        &clinical
            .map(|c| c.service_quantity.clone())
            .unwrap_or_else(|| "1".to_string()),
    );
    let total = total_billed(row, clinical);
    let unit_value = normalize_unit_value(
        &clinical.map(|c| c.unit_value.clone()).unwrap_or_default(),
        &total,
    );

    let fields: Vec<String> = vec![
        invoice.as_str().to_string(),
        invoice.consecutive(),
        "2".to_string(),
        service_code,
        service_description,
        quantity,
        unit_value,
        total.clone(),
        total,
    ];

    finish_line("FURIPS2", invoice, fields, LINE2_FIELD_COUNT)
}

/// Sanitize every field, pad to the fixed width, join and verify the final
/// comma-delimited shape. Sanitization removes commas, so the re-split count
/// equals the field count unless assembly itself is broken.
fn finish_line(
    file: &'static str,
    invoice: &InvoiceId,
    fields: Vec<String>,
    expected: usize,
) -> Result<String> {
    let mut sanitized: Vec<String> = fields.iter().map(|f| sanitize_field(f)).collect();
    if sanitized.len() > expected {
        sanitized.truncate(expected);
    } else {
        sanitized.resize(expected, String::new());
    }
    let line = sanitized.join(",");
    let actual = line.split(',').count();
    if actual != expected {
        return Err(ExportError::FieldCount {
            file,
            invoice: invoice.as_str().to_string(),
            expected,
            actual,
        });
    }
    Ok(line)
}

/// The victim block prefers the clinical record and falls back to the
/// analytical row's owner columns field by field.
fn victim_block(row: &SqlRow, clinical: Option<&ClinicalRecord>) -> Victim {
    let doc_type_source = clinical
        .and_then(|c| non_empty(&c.document_type))
        .unwrap_or_else(|| row.get("TIPODOC_PROPIETARIO").to_string());
    Victim {
        identity: Identity {
            surname1: clinical.map(|c| c.surname1.clone()).unwrap_or_default(),
            surname2: clinical.map(|c| c.surname2.clone()).unwrap_or_default(),
            given_name1: clinical.map(|c| c.given_name1.clone()).unwrap_or_default(),
            given_name2: clinical.map(|c| c.given_name2.clone()).unwrap_or_default(),
            doc_type: normalize_doc_type(&doc_type_source),
            document: clinical
                .and_then(|c| non_empty(&c.document))
                .unwrap_or_else(|| row.get("CEDULA").to_string()),
            address: clinical
                .and_then(|c| non_empty(&c.address))
                .unwrap_or_else(|| row.get("DIRECCION_PROPIETARIO").to_string()),
            phone: clinical
                .and_then(|c| non_empty(&c.phone))
                .unwrap_or_else(|| row.get("TELEFONO_PROPIETARIO").to_string()),
            department: clinical
                .and_then(|c| non_empty(&c.department))
                .unwrap_or_else(|| owner_department(row)),
            municipality: clinical
                .and_then(|c| non_empty(&c.municipality))
                .unwrap_or_else(|| owner_municipality(row)),
        },
        birth_date: clinical
            .and_then(|c| non_empty(&c.birth_date))
            .unwrap_or_else(|| format_date(row.get("FECHANAC"))),
        sex: clinical
            .and_then(|c| non_empty(&c.sex))
            .unwrap_or_else(|| row.get("SEXO").to_string()),
    }
}

fn owner_block(row: &SqlRow) -> Identity {
    Identity {
        surname1: row.get("APELLIDO1_PROPIETARIO").to_string(),
        surname2: row.get("APELLIDO2_PROPIETARIO").to_string(),
        given_name1: row.get("NOMBRE1_PROPIETARIO").to_string(),
        given_name2: row.get("NOMBRE2_PROPIETARIO").to_string(),
        doc_type: normalize_doc_type(row.get("TIPODOC_PROPIETARIO")),
        document: row.get("N_DOCUMENTO_PROPIETARIO").to_string(),
        address: row.get("DIRECCION_PROPIETARIO").to_string(),
        phone: row.get("TELEFONO_PROPIETARIO").to_string(),
        department: owner_department(row),
        municipality: owner_municipality(row),
    }
}

fn driver_block(row: &SqlRow) -> Identity {
    Identity {
        surname1: row.get("APELLIDO1_CONDUCTOR").to_string(),
        surname2: row.get("APELLIDO2_CONDUCTOR").to_string(),
        given_name1: row.get("NOMBRE1_CONDUCTOR").to_string(),
        given_name2: row.get("NOMBRE2_CONDUCTOR").to_string(),
        doc_type: normalize_doc_type(row.get("TIPODOC_CONDUCTOR")),
        document: row.get("N_DOCUMENTO_CONDUCTOR").to_string(),
        address: row.get("DIRECCION_CONDUCTOR").to_string(),
        phone: row.get("TELEFONO_CONDUCTOR").to_string(),
        department: row
            .get_non_empty("DEPARTAMENTO_CONDUCTOR")
            .map(str::to_string)
            .unwrap_or_else(|| row.get("COD_DEPTO").to_string()),
        municipality: row
            .get_non_empty("MUNICIPIO_CONDUCTOR")
            .map(str::to_string)
            .unwrap_or_else(|| municipality_mid(row.get("COD_MUNICIPIO"))),
    }
}

fn owner_department(row: &SqlRow) -> String {
    row.get_non_empty("DEPARTAMENTO_PROPIETARIO")
        .map(str::to_string)
        .unwrap_or_else(|| row.get("COD_DEPTO").to_string())
}

fn owner_municipality(row: &SqlRow) -> String {
    row.get_non_empty("MUNICIPIO_PROPIETARIO")
        .map(str::to_string)
        .unwrap_or_else(|| municipality_mid(row.get("COD_MUNICIPIO")))
}

fn total_billed(row: &SqlRow, clinical: Option<&ClinicalRecord>) -> String {
    clinical
        .and_then(|c| non_empty(&c.total))
        .or_else(|| row.get_non_empty("TOTAL_FACTURADO").map(str::to_string))
        .or_else(|| row.get_non_empty("TOTAL").map(str::to_string))
        .unwrap_or_else(|| "0".to_string())
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn is_affirmative(value: &str) -> bool {
    value.trim().eq_ignore_ascii_case("SI")
}

/// Address fields drop commas outright instead of spacing them, so
/// `CRA 7, APT 2` renders `CRA 7 APT 2` rather than splitting the token.
fn strip_commas(value: &str) -> String {
    value.replace(',', "")
}
