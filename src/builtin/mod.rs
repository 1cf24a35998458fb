//! Built-in comparison function signatures.
//!
//! A signature is an [`Expression`] node bound to one function and one
//! operand domain. Signatures that do not support batch evaluation report
//! `vectorized() == false` and fail every batch entry point with
//! `NotVectorized`; their row entry points always work.

mod coalesce;
mod compare;
mod extremum;
mod interval;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, VexprError};
use crate::expression::Expression;
use crate::kernels::{CompareOp, Extremum, IntervalSearch};
use crate::types::EvalType;

pub use coalesce::CoalesceSig;
pub use compare::CompareSig;
pub use extremum::ExtremumSig;
pub use interval::IntervalSig;

/// Function of the comparison family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonFunction {
    Compare(CompareOp),
    Greatest,
    Least,
    Coalesce,
    Interval(IntervalSearch),
}

/// Builds the signature of `func` over operands of `domain`.
///
/// For `Compare`, `domain` is the operand domain; the result is always `Int`.
/// For `Interval`, `domain` is the target domain (`Int` or `Real`).
///
/// # Errors
///
/// Returns `InvalidArgument` on a wrong operand count and a type error if an
/// operand does not evaluate in `domain`.
pub fn new_signature(
    func: ComparisonFunction,
    domain: EvalType,
    args: Vec<Box<dyn Expression>>,
) -> Result<Box<dyn Expression>> {
    let sig: Box<dyn Expression> = match func {
        ComparisonFunction::Compare(op) => {
            let [lhs, rhs] = <[Box<dyn Expression>; 2]>::try_from(args).map_err(|args| {
                VexprError::InvalidArgument(format!(
                    "{} expects 2 arguments, got {}",
                    op.name(),
                    args.len()
                ))
            })?;
            Box::new(CompareSig::new(op, domain, lhs, rhs)?)
        }
        ComparisonFunction::Greatest => {
            Box::new(ExtremumSig::new(Extremum::Greatest, domain, args)?)
        }
        ComparisonFunction::Least => Box::new(ExtremumSig::new(Extremum::Least, domain, args)?),
        ComparisonFunction::Coalesce => Box::new(CoalesceSig::new(domain, args)?),
        ComparisonFunction::Interval(search) => {
            let sig = IntervalSig::new(args, search)?;
            if sig.target_domain() != domain {
                return Err(VexprError::TypeError {
                    expected: domain.name().into(),
                    actual: sig.target_domain().name().into(),
                });
            }
            Box::new(sig)
        }
    };
    Ok(sig)
}

fn not_vectorized(signature: &str) -> VexprError {
    debug!(signature, "batch entry point invoked on a row-only signature");
    VexprError::NotVectorized(signature.to_string())
}

fn check_min_arity(function: &str, args: &[Box<dyn Expression>], min: usize) -> Result<()> {
    if args.len() < min {
        return Err(VexprError::InvalidArgument(format!(
            "{function} expects at least {min} argument(s), got {}",
            args.len()
        )));
    }
    Ok(())
}

fn check_operands<'a>(
    domain: EvalType,
    args: impl IntoIterator<Item = &'a dyn Expression>,
) -> Result<()> {
    match args.into_iter().find(|arg| arg.field_type().eval_type != domain) {
        Some(arg) => Err(VexprError::TypeError {
            expected: domain.name().into(),
            actual: format!("{} ({})", arg.field_type().eval_type, arg.name()),
        }),
        None => Ok(()),
    }
}
