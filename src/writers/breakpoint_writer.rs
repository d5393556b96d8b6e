
use anyhow::Context;
use log::{debug, info};
use noodles::vcf;
use noodles::vcf::header::record::value::map::{self, Contig, Info};
use noodles::vcf::header::record::value::Map;
use noodles::vcf::variant::io::Write;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use crate::data_types::breakpoint::ConsensusBreakpoint;
use crate::parsing::contigs::ReferenceContig;
use crate::parsing::reference::ReferenceReader;
use crate::writers::breakpoint_records::{
    BreakpointRenderer, BP_NOTATION_KEY, CLUSTER_KEY, NORMAL_SUPPORT_KEY, SVLEN_KEY, SVTYPE_KEY, TUMOUR_SUPPORT_KEY
};

/// Names that go into the VCF header metadata
#[derive(Clone, Debug)]
pub struct HeaderSamples {
    /// Sample label of the run, also the output file prefix
    pub sample: String,
    /// Tumour alignment file
    pub tumour_fn: PathBuf,
    /// Normal alignment file
    pub normal_fn: PathBuf
}

/// The three files produced for a breakpoint set
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BreakpointOutputs {
    pub vcf_fn: PathBuf,
    pub bedpe_fn: PathBuf,
    pub read_support_fn: PathBuf
}

impl BreakpointOutputs {
    /// Standard filenames for a sample inside the output folder
    pub fn new(output_folder: &Path, sample: &str) -> Self {
        Self {
            vcf_fn: output_folder.join(format!("{sample}.sv_breakpoints.vcf")),
            bedpe_fn: output_folder.join(format!("{sample}.sv_breakpoints.bedpe")),
            read_support_fn: output_folder.join(format!("{sample}.sv_breakpoints_read_support.tsv"))
        }
    }
}

/// Builds the breakpoint VCF header
/// # Arguments
/// * `contigs` - reference contigs with lengths, in index order
/// * `samples` - run sample metadata
/// # Errors
/// * if a header key fails to parse or conflicts
pub fn build_breakpoint_header(contigs: &[ReferenceContig], samples: &HeaderSamples) -> anyhow::Result<vcf::Header> {
    let mut builder = vcf::Header::builder();
    for contig in contigs.iter() {
        let mut contig_map = Map::<Contig>::new();
        *contig_map.length_mut() = Some(contig.length() as usize);
        builder = builder.add_contig(contig.name(), contig_map);
    }

    let info_fields = [
        (SVTYPE_KEY, map::info::Number::Count(1), map::info::Type::String, "Type of structural variant"),
        (SVLEN_KEY, map::info::Number::Count(1), map::info::Type::Integer, "Length of structural variant, 0 between contigs"),
        (BP_NOTATION_KEY, map::info::Number::Count(1), map::info::Type::String, "Orientation of the breakpoint (+-, ++, -+, --, <INS>)"),
        (TUMOUR_SUPPORT_KEY, map::info::Number::Count(1), map::info::Type::Integer, "Number of unique tumour reads supporting the breakpoint"),
        (NORMAL_SUPPORT_KEY, map::info::Number::Count(1), map::info::Type::Integer, "Number of unique normal reads supporting the breakpoint"),
        (CLUSTER_KEY, map::info::Number::Unknown, map::info::Type::String, "Clusters the breakpoint was called from")
    ];
    for (key, number, ty, description) in info_fields.into_iter() {
        builder = builder.add_info(key, Map::<Info>::new(number, ty, description));
    }
    let mut header = builder.build();

    let ver: &str = crate::cli::core::FULL_VERSION.as_str();
    let cli_string = std::env::args().collect::<Vec<String>>().join(" ");
    let metadata = [
        ("fileDate", chrono::Local::now().format("%Y%m%d").to_string()),
        ("savana_version", format!("\"{ver}\"")),
        ("savana_command", format!("\"{cli_string}\"")),
        ("savana_sample", samples.sample.clone()),
        ("savana_tumour", samples.tumour_fn.display().to_string()),
        ("savana_normal", samples.normal_fn.display().to_string())
    ];
    for (key, value) in metadata.into_iter() {
        header.insert(key.parse()?, vcf::header::record::Value::from(value))?;
    }
    Ok(header)
}

/// Renders every breakpoint into the VCF, BEDPE and read-support files in a single pass.
/// An empty breakpoint list still produces a header-only VCF.
/// # Arguments
/// * `breakpoints` - enumerated breakpoints in output order
/// * `header` - VCF header from `build_breakpoint_header`
/// * `reference` - provides REF bases
/// * `outputs` - where to write
/// # Errors
/// * if any file cannot be created or written
/// * if a REF base cannot be fetched
pub fn write_breakpoints(
    breakpoints: &[ConsensusBreakpoint], header: &vcf::Header, reference: &mut ReferenceReader, outputs: &BreakpointOutputs
) -> anyhow::Result<()> {
    info!("Writing {} breakpoints to {:?}...", breakpoints.len(), outputs.vcf_fn);
    let vcf_file = File::create(&outputs.vcf_fn)
        .with_context(|| format!("Error while creating {:?}:", outputs.vcf_fn))?;
    let mut vcf_writer = vcf::io::Writer::new(BufWriter::new(vcf_file));
    vcf_writer.write_header(header)
        .with_context(|| format!("Error while writing header to {:?}:", outputs.vcf_fn))?;

    let mut bedpe_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(&outputs.bedpe_fn)
        .with_context(|| format!("Error while creating {:?}:", outputs.bedpe_fn))?;
    let mut support_writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(&outputs.read_support_fn)
        .with_context(|| format!("Error while creating {:?}:", outputs.read_support_fn))?;

    for breakpoint in breakpoints.iter() {
        let record = breakpoint.as_vcf_record(reference)?;
        vcf_writer.write_variant_record(header, &record)
            .with_context(|| format!("Error while writing {} to {:?}:", breakpoint.label(), outputs.vcf_fn))?;
        bedpe_writer.serialize(breakpoint.as_bedpe_row())?;
        support_writer.serialize(breakpoint.as_read_support_row())?;
    }

    std::io::Write::flush(vcf_writer.get_mut())?;
    bedpe_writer.flush()?;
    support_writer.flush()?;
    debug!("Finished writing {:?} and {:?}", outputs.bedpe_fn, outputs.read_support_fn);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::data_types::breakpoint::{enumerate_breakpoints, BreakpointCall};
    use crate::data_types::evidence::BreakpointLocation;
    use crate::data_types::orientation::OrientationClass;
    use crate::parsing::contigs::load_fasta_index;
    use crate::parsing::reference::tests::write_test_reference;

    fn samples() -> HeaderSamples {
        HeaderSamples {
            sample: "sample1".to_string(),
            tumour_fn: PathBuf::from("tumour.bam"),
            normal_fn: PathBuf::from("normal.bam")
        }
    }

    fn call(class: OrientationClass, contig: &str, pos: u64, mate_contig: &str, mate_pos: u64, tumour: &[&str], normal: &[&str]) -> BreakpointCall {
        BreakpointCall::new(
            class,
            BreakpointLocation::new(contig.to_string(), pos),
            BreakpointLocation::new(mate_contig.to_string(), mate_pos),
            if class.is_insertion() { 45 } else { 0 },
            tumour.iter().map(|s| s.to_string()).collect(),
            normal.iter().map(|s| s.to_string()).collect::<BTreeSet<String>>(),
            vec![format!("{contig}_{}_{pos}", class.code())]
        )
    }

    /// VCF data lines only
    fn vcf_body(vcf_fn: &Path) -> Vec<Vec<String>> {
        std::fs::read_to_string(vcf_fn).unwrap()
            .lines()
            .filter(|l| !l.starts_with('#'))
            .map(|l| l.split('\t').map(String::from).collect())
            .collect()
    }

    fn tsv_rows(tsv_fn: &Path, skip: usize) -> Vec<Vec<String>> {
        std::fs::read_to_string(tsv_fn).unwrap()
            .lines()
            .skip(skip)
            .map(|l| l.split('\t').map(String::from).collect())
            .collect()
    }

    #[test]
    fn test_cross_format_ordinals() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let (fasta_fn, fai_fn) = write_test_reference(tmp_dir.path(), &[
            ("chr1", "ACGTACGTACGTACGTACGT"), ("chr2", "GGGGCCCCAAAATTTT")
        ]);
        let contigs = load_fasta_index(&fai_fn).unwrap();
        let mut reference = ReferenceReader::open(&fasta_fn, &fai_fn).unwrap();

        let breakpoints = enumerate_breakpoints(vec![
            call(OrientationClass::PlusMinus, "chr1", 2, "chr1", 15, &["a", "b"], &[]),
            call(OrientationClass::Insertion, "chr1", 7, "chr1", 7, &["c"], &["n1"]),
            call(OrientationClass::MinusMinus, "chr1", 12, "chr2", 4, &["d", "e", "f"], &[]),
            call(OrientationClass::PlusPlus, "chr2", 9, "chr2", 13, &["g"], &["n2", "n3"]),
        ]);

        let outputs = BreakpointOutputs::new(tmp_dir.path(), "sample1");
        let header = build_breakpoint_header(&contigs, &samples()).unwrap();
        write_breakpoints(&breakpoints, &header, &mut reference, &outputs).unwrap();

        let vcf = vcf_body(&outputs.vcf_fn);
        let bedpe = tsv_rows(&outputs.bedpe_fn, 0);
        let support = tsv_rows(&outputs.read_support_fn, 1);
        assert_eq!(vcf.len(), 4);
        assert_eq!(bedpe.len(), 4);
        assert_eq!(support.len(), 4);

        for (i, bp) in breakpoints.iter().enumerate() {
            let label = format!("ID_{i}");
            assert_eq!(vcf[i][2], label);
            assert_eq!(bedpe[i][6], label);
            assert_eq!(support[i][0], label);

            // same breakpoint described in each
            assert_eq!(vcf[i][0], bp.call().start().contig());
            assert_eq!(vcf[i][1], (bp.call().start().position() + 1).to_string());
            assert_eq!(bedpe[i][1], bp.call().start().position().to_string());
            assert_eq!(bedpe[i][7], bp.tumour_support().to_string());
            assert_eq!(support[i][1], bp.tumour_support().to_string());
            assert_eq!(support[i][2], bp.normal_support().to_string());
        }

        // REF and ALT
        assert_eq!(vcf[0][3], "G");
        assert_eq!(vcf[0][4], "G[chr1:16[");
        assert_eq!(vcf[1][4], "<INS>");
        assert_eq!(vcf[2][4], "[chr2:5[A");
        assert!(vcf[1][7].contains("SVTYPE=INS"));
        assert!(vcf[1][7].contains("SVLEN=45"));
        assert!(vcf[3][7].contains("NORMAL_SUPPORT=2"));
    }

    #[test]
    fn test_empty_breakpoints() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let (fasta_fn, fai_fn) = write_test_reference(tmp_dir.path(), &[("chr1", "ACGT")]);
        let contigs = load_fasta_index(&fai_fn).unwrap();
        let mut reference = ReferenceReader::open(&fasta_fn, &fai_fn).unwrap();

        let outputs = BreakpointOutputs::new(tmp_dir.path(), "empty");
        let header = build_breakpoint_header(&contigs, &samples()).unwrap();
        write_breakpoints(&[], &header, &mut reference, &outputs).unwrap();

        let contents = std::fs::read_to_string(&outputs.vcf_fn).unwrap();
        assert!(contents.starts_with("##fileformat=VCF"));
        assert!(contents.contains("##contig=<ID=chr1,length=4>"));
        assert!(contents.contains("##INFO=<ID=BP_NOTATION"));
        assert!(vcf_body(&outputs.vcf_fn).is_empty());
        assert_eq!(std::fs::read_to_string(&outputs.bedpe_fn).unwrap(), "");
    }
}
