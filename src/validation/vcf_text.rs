
use anyhow::{anyhow, Context};
use indexmap::IndexMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Parsed INFO column: `KEY=VALUE` pairs and bare flags, in file order
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct InfoFields {
    fields: IndexMap<String, Option<String>>
}

impl InfoFields {
    /// Parses a raw INFO string. `.` and empty strings yield no fields.
    pub fn parse(info: &str) -> Self {
        let fields = info.split(';')
            .filter(|entry| !entry.is_empty() && *entry != ".")
            .map(|entry| match entry.split_once('=') {
                Some((key, value)) => (key.to_string(), Some(value.to_string())),
                None => (entry.to_string(), None)
            })
            .collect();
        Self { fields }
    }

    /// True if the key is present, with or without a value
    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// The raw value of a key; `None` for flags and missing keys
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_deref())
    }

    /// The value parsed as an integer; `None` if missing or not an integer
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_str(key).and_then(|v| v.parse().ok())
    }

    /// The value split on commas, skipping empty entries
    pub fn get_list(&self, key: &str) -> Option<Vec<String>> {
        self.get_str(key).map(|v| {
            v.split(',')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
    }
}

/// The fixed columns of a VCF data line that the matcher reads
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct VcfLine {
    pub chrom: String,
    /// 1-based
    pub pos: u64,
    pub label: String,
    pub alt: String,
    pub info: String
}

/// Opens a VCF as decompressed text. Any `.gz` file is read as multi-member gzip, which covers both gzip and bgzip.
/// # Errors
/// * if the file cannot be opened
pub fn open_vcf_stream(filename: &Path) -> anyhow::Result<Box<dyn BufRead>> {
    let file = File::open(filename)
        .with_context(|| format!("Error while opening {filename:?}:"))?;
    Ok(if filename.extension().unwrap_or_default() == "gz" {
        Box::new(BufReader::new(flate2::read::MultiGzDecoder::new(file)))
    } else {
        Box::new(BufReader::new(file))
    })
}

/// Reads every data line of a plain or gzipped (`.gz`) VCF, skipping header lines
/// # Errors
/// * if the file cannot be opened
/// * if a data line has fewer than 8 columns or a non-integer position
pub fn read_vcf_lines(filename: &Path) -> anyhow::Result<Vec<VcfLine>> {
    let fp = open_vcf_stream(filename)?;

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .comment(Some(b'#'))
        .from_reader(fp);

    let mut lines = vec![];
    for result in csv_reader.records() {
        let row = result.with_context(|| format!("Error while reading {filename:?}:"))?;
        if row.len() < 8 {
            return Err(anyhow!("Expected at least 8 columns in {filename:?}, found {}: {row:?}", row.len()));
        }
        let pos: u64 = row[1].parse()
            .with_context(|| format!("Invalid position {:?} in {filename:?}", &row[1]))?;
        lines.push(VcfLine {
            chrom: row[0].to_string(),
            pos,
            label: row[2].to_string(),
            alt: row[4].to_string(),
            info: row[7].to_string()
        });
    }
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_info_fields() {
        let info = InfoFields::parse("SVTYPE=BND;SVLEN=-1200;IMPRECISE;CLUSTER=chr1_PM_0,chr1_PM_2;BP_NOTATION=+-");
        assert_eq!(info.get_str("SVTYPE"), Some("BND"));
        assert_eq!(info.get_i64("SVLEN"), Some(-1200));
        assert!(info.contains("IMPRECISE"));
        assert_eq!(info.get_str("IMPRECISE"), None);
        assert_eq!(info.get_list("CLUSTER"), Some(vec!["chr1_PM_0".to_string(), "chr1_PM_2".to_string()]));
        assert_eq!(info.get_str("BP_NOTATION"), Some("+-"));
        assert_eq!(info.get_i64("SVTYPE"), None);
        assert!(!info.contains("MISSING"));

        assert_eq!(InfoFields::parse("."), InfoFields::default());
    }

    #[test]
    fn test_read_vcf_lines() {
        let mut vcf = tempfile::Builder::new().suffix(".vcf").tempfile().unwrap();
        writeln!(vcf, "##fileformat=VCFv4.2").unwrap();
        writeln!(vcf, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
        writeln!(vcf, "chr1\t100\tA\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL;NOTE=\"quoted text\"").unwrap();
        writeln!(vcf, "chr2\t5000\tB\tN\t<INS>\t.\tPASS\tSVTYPE=INS\tGT\t0/1").unwrap();
        vcf.flush().unwrap();

        let lines = read_vcf_lines(vcf.path()).unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].chrom, "chr1");
        assert_eq!(lines[0].pos, 100);
        assert_eq!(lines[0].label, "A");
        assert_eq!(lines[0].info, "SVTYPE=DEL;NOTE=\"quoted text\"");
        assert_eq!(lines[1].info, "SVTYPE=INS");
    }

    #[test]
    fn test_read_gz() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let vcf_fn = tmp_dir.path().join("truth.vcf.gz");
        let mut encoder = flate2::write::GzEncoder::new(File::create(&vcf_fn).unwrap(), flate2::Compression::default());
        writeln!(encoder, "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO").unwrap();
        writeln!(encoder, "1\t42\tX\tN\t<DUP>\t.\tPASS\tSVTYPE=DUP").unwrap();
        encoder.finish().unwrap();

        let lines = read_vcf_lines(&vcf_fn).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].pos, 42);
    }

    #[test]
    fn test_bad_lines() {
        let mut vcf = tempfile::NamedTempFile::new().unwrap();
        writeln!(vcf, "chr1\tabc\tA\tN\t<DEL>\t.\tPASS\tSVTYPE=DEL").unwrap();
        vcf.flush().unwrap();
        assert!(read_vcf_lines(vcf.path()).is_err());

        let mut vcf = tempfile::NamedTempFile::new().unwrap();
        writeln!(vcf, "chr1\t100\tA").unwrap();
        vcf.flush().unwrap();
        assert!(read_vcf_lines(vcf.path()).is_err());
    }
}
