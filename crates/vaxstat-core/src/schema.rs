/// Column types of the source CSV files.
///
/// Only the columns the loader reads are listed; any other column in a file
/// is read as `Utf8` and ignored.
pub mod input {
    use arrow::datatypes::{DataType, Field, Schema};

    use crate::{Brand, Dose};

    fn date_field(name: &str) -> Field {
        Field::new(name, DataType::Date32, true)
    }

    fn int_field(name: &str) -> Field {
        Field::new(name, DataType::Int64, true)
    }

    fn float_field(name: &str) -> Field {
        Field::new(name, DataType::Float64, true)
    }

    fn brand_fields() -> Vec<Field> {
        ["brand1", "brand2", "brand3"]
            .into_iter()
            .map(|name| Field::new(name, DataType::Utf8, true))
            .collect()
    }

    /// `linelist_cases*.csv`: day offsets are published as floats.
    pub fn linelist_cases_schema() -> Schema {
        let mut fields = vec![
            date_field("date"),
            int_field("age"),
            float_field("days_dose1"),
            float_field("days_dose2"),
            float_field("days_dose3"),
        ];
        fields.extend(brand_fields());
        Schema::new(fields)
    }

    /// `linelist_deaths.csv`: dose dates instead of day offsets.
    pub fn linelist_deaths_schema() -> Schema {
        let mut fields = vec![
            date_field("date"),
            date_field("date_positive"),
            date_field("date_dose1"),
            date_field("date_dose2"),
            date_field("date_dose3"),
            int_field("age"),
        ];
        fields.extend(brand_fields());
        Schema::new(fields)
    }

    /// Column name for a brand's daily doses, e.g. `sinovac2`.
    pub fn dose_column(brand: Brand, dose: Dose) -> Option<String> {
        brand
            .column_prefix()
            .map(|prefix| format!("{prefix}{}", dose.number()))
    }

    /// `vax_malaysia.csv`.
    pub fn vaccination_schema() -> Schema {
        let mut fields = vec![
            date_field("date"),
            int_field("daily"),
            int_field("daily_partial"),
            int_field("daily_booster"),
        ];
        for brand in Brand::TRACKED {
            for dose in Dose::ALL {
                if let Some(name) = dose_column(brand, dose) {
                    fields.push(int_field(&name));
                }
            }
        }
        Schema::new(fields)
    }

    /// `vax_booster_combos.csv`. Every other column is a combination count.
    pub fn booster_combos_schema() -> Schema {
        Schema::new(vec![
            date_field("date"),
            Field::new("state", DataType::Utf8, true),
        ])
    }

    /// `population.csv`.
    pub fn population_schema() -> Schema {
        Schema::new(vec![
            Field::new("state", DataType::Utf8, false),
            int_field("pop"),
        ])
    }

    /// `cases_malaysia.csv`.
    pub fn national_cases_schema() -> Schema {
        Schema::new(vec![date_field("date"), int_field("cases_new")])
    }

    /// `hospital.csv` (one row per state per day).
    pub fn hospital_schema() -> Schema {
        Schema::new(vec![
            date_field("date"),
            Field::new("state", DataType::Utf8, true),
            int_field("admitted_covid"),
            int_field("hosp_covid"),
        ])
    }

    /// `deaths_malaysia.csv`.
    pub fn national_deaths_schema() -> Schema {
        Schema::new(vec![date_field("date"), int_field("deaths_new_dod")])
    }
}

/// Arrow schemas for derived series handed to the presentation layer.
pub mod output {
    use arrow::datatypes::{DataType, Field, Schema};

    /// A date-indexed series: `date` then one nullable `Float64` per column.
    ///
    /// Null cells are gaps (missing reference data) or suppressed values.
    pub fn series_schema<S: AsRef<str>>(columns: &[S]) -> Schema {
        let mut fields = vec![Field::new("date", DataType::Date32, false)];
        fields.extend(
            columns
                .iter()
                .map(|c| Field::new(c.as_ref(), DataType::Float64, true)),
        );
        Schema::new(fields)
    }

    /// Binned density curve: bin midpoint and density or frequency.
    pub fn density_schema() -> Schema {
        Schema::new(vec![
            Field::new("x", DataType::Float64, false),
            Field::new("y", DataType::Float64, false),
        ])
    }
}
