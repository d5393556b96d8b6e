
use anyhow::Context;
use itertools::Itertools;
use noodles::core::Position;
use noodles::vcf::variant::record_buf::{self, info::field::Value as InfoValue};
use noodles::vcf::variant::RecordBuf;
use serde::Serialize;

use crate::data_types::breakpoint::ConsensusBreakpoint;
use crate::data_types::evidence::SampleLabel;
use crate::data_types::orientation::OrientationClass;
use crate::parsing::reference::ReferenceReader;

pub const SVTYPE_KEY: &str = "SVTYPE";
pub const SVLEN_KEY: &str = "SVLEN";
pub const BP_NOTATION_KEY: &str = "BP_NOTATION";
pub const TUMOUR_SUPPORT_KEY: &str = "TUMOUR_SUPPORT";
pub const NORMAL_SUPPORT_KEY: &str = "NORMAL_SUPPORT";
pub const CLUSTER_KEY: &str = "CLUSTER";

/// One line of the BEDPE output; written without a header
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BedpeRow {
    chrom1: String,
    start1: u64,
    end1: u64,
    chrom2: String,
    start2: u64,
    end2: u64,
    name: String,
    tumour_support: usize,
    strand1: char,
    strand2: char,
    bp_notation: String,
    normal_support: usize,
    cluster_ids: String
}

/// One line of the read-support TSV
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReadSupportRow {
    breakpoint_id: String,
    tumour_support: usize,
    normal_support: usize,
    tumour_reads: String,
    normal_reads: String
}

/// The three renderings every breakpoint output needs.
/// Every rendering of the same breakpoint carries the same `ID_<ordinal>` label.
pub trait BreakpointRenderer {
    /// VCF record; the reference provides the REF base
    fn as_vcf_record(&self, reference: &mut ReferenceReader) -> anyhow::Result<RecordBuf>;
    /// BEDPE row
    fn as_bedpe_row(&self) -> BedpeRow;
    /// Read-support row
    fn as_read_support_row(&self) -> ReadSupportRow;
}

/// Breakend ALT notation for a paired class, `<INS>` for insertions
/// # Arguments
/// * `orientation` - class of the breakpoint
/// * `ref_base` - the REF base at the first breakend
/// * `mate` - 1-based `contig:position` of the second breakend
pub fn alt_notation(orientation: OrientationClass, ref_base: char, mate: &str) -> String {
    match orientation {
        OrientationClass::PlusMinus => format!("{ref_base}[{mate}["),
        OrientationClass::PlusPlus => format!("{ref_base}]{mate}]"),
        OrientationClass::MinusPlus => format!("]{mate}]{ref_base}"),
        OrientationClass::MinusMinus => format!("[{mate}[{ref_base}"),
        OrientationClass::Insertion => "<INS>".to_string()
    }
}

impl BreakpointRenderer for ConsensusBreakpoint {
    fn as_vcf_record(&self, reference: &mut ReferenceReader) -> anyhow::Result<RecordBuf> {
        let call = self.call();
        let start = call.start();
        let end = call.end();
        let ref_base = reference.base_at(start.contig(), start.position())
            .with_context(|| format!("Error while rendering {}:", self.label()))?;
        let mate = format!("{}:{}", end.contig(), end.position() + 1);
        let orientation = call.orientation();
        let sv_type = if orientation.is_insertion() { "INS" } else { "BND" };

        let info: record_buf::Info = [
            (SVTYPE_KEY.to_string(), Some(InfoValue::from(sv_type))),
            (SVLEN_KEY.to_string(), Some(InfoValue::from(i32::try_from(call.sv_length())?))),
            (BP_NOTATION_KEY.to_string(), Some(InfoValue::from(orientation.as_ref()))),
            (TUMOUR_SUPPORT_KEY.to_string(), Some(InfoValue::from(i32::try_from(self.tumour_support())?))),
            (NORMAL_SUPPORT_KEY.to_string(), Some(InfoValue::from(i32::try_from(self.normal_support())?))),
            (CLUSTER_KEY.to_string(), Some(InfoValue::from(
                call.cluster_ids().iter().map(|id| Some(id.clone())).collect::<Vec<Option<String>>>()
            )))
        ].into_iter().collect();

        Ok(RecordBuf::builder()
            .set_reference_sequence_name(start.contig())
            .set_variant_start(Position::try_from(start.position() as usize + 1)?)
            .set_ids([self.label()].into_iter().collect())
            .set_reference_bases(ref_base.to_string())
            .set_alternate_bases(record_buf::AlternateBases::from(vec![alt_notation(orientation, ref_base, &mate)]))
            .set_info(info)
            .build())
    }

    fn as_bedpe_row(&self) -> BedpeRow {
        let call = self.call();
        let (strand1, strand2) = match call.orientation().sides() {
            Some((first, second)) => (first.symbol(), second.symbol()),
            None => ('.', '.')
        };
        BedpeRow {
            chrom1: call.start().contig().to_string(),
            start1: call.start().position(),
            end1: call.start().position() + 1,
            chrom2: call.end().contig().to_string(),
            start2: call.end().position(),
            end2: call.end().position() + 1,
            name: self.label(),
            tumour_support: self.tumour_support(),
            strand1,
            strand2,
            bp_notation: call.orientation().to_string(),
            normal_support: self.normal_support(),
            cluster_ids: call.cluster_ids().join(",")
        }
    }

    fn as_read_support_row(&self) -> ReadSupportRow {
        let call = self.call();
        ReadSupportRow {
            breakpoint_id: self.label(),
            tumour_support: self.tumour_support(),
            normal_support: self.normal_support(),
            tumour_reads: call.supporting_reads(SampleLabel::Tumour).iter().join(","),
            normal_reads: call.supporting_reads(SampleLabel::Normal).iter().join(",")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    use crate::data_types::breakpoint::{enumerate_breakpoints, BreakpointCall};
    use crate::data_types::evidence::BreakpointLocation;

    fn breakpoint() -> ConsensusBreakpoint {
        let call = BreakpointCall::new(
            OrientationClass::MinusPlus,
            BreakpointLocation::new("chr1".to_string(), 9),
            BreakpointLocation::new("chr2".to_string(), 99),
            0,
            ["t2", "t1"].iter().map(|s| s.to_string()).collect(),
            BTreeSet::new(),
            vec!["chr1_MP_0".to_string(), "chr1_MP_3".to_string()]
        );
        enumerate_breakpoints(vec![call]).remove(0)
    }

    #[test]
    fn test_alt_notation() {
        assert_eq!(alt_notation(OrientationClass::PlusMinus, 'A', "chr2:100"), "A[chr2:100[");
        assert_eq!(alt_notation(OrientationClass::PlusPlus, 'A', "chr2:100"), "A]chr2:100]");
        assert_eq!(alt_notation(OrientationClass::MinusPlus, 'A', "chr2:100"), "]chr2:100]A");
        assert_eq!(alt_notation(OrientationClass::MinusMinus, 'A', "chr2:100"), "[chr2:100[A");
        assert_eq!(alt_notation(OrientationClass::Insertion, 'A', "chr2:100"), "<INS>");
    }

    #[test]
    fn test_bedpe_row() {
        let row = breakpoint().as_bedpe_row();
        assert_eq!(row, BedpeRow {
            chrom1: "chr1".to_string(), start1: 9, end1: 10,
            chrom2: "chr2".to_string(), start2: 99, end2: 100,
            name: "ID_0".to_string(),
            tumour_support: 2,
            strand1: '-', strand2: '+',
            bp_notation: "-+".to_string(),
            normal_support: 0,
            cluster_ids: "chr1_MP_0,chr1_MP_3".to_string()
        });
    }

    #[test]
    fn test_read_support_row() {
        let row = breakpoint().as_read_support_row();
        assert_eq!(row, ReadSupportRow {
            breakpoint_id: "ID_0".to_string(),
            tumour_support: 2,
            normal_support: 0,
            tumour_reads: "t1,t2".to_string(),
            normal_reads: String::new()
        });
    }
}
