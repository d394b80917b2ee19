//! The built-in TRE descriptor table.
//!
//! Only the domain TREs the engine itself relies on ship as source; the
//! long tail of TREs is contributed through the plug-in registry.
use crate::enums::CharClass;
use crate::tre::descriptor::{TreDescriptionBuilder, TreDescriptor};
use crate::tre::registry::TreRegistry;

/// PIATGA: the profile-for-imagery-access target TRE.
pub fn piatga() -> TreDescriptor {
    let description = TreDescriptionBuilder::new()
        .field("TGTUTM", "Target UTM", CharClass::BcsAPlus, 15)
        .and_then(|b| b.field("PIATGAID", "Target ID", CharClass::BcsAPlus, 15))
        .and_then(|b| b.field("PIACTRY", "Country Code", CharClass::BcsAPlus, 2))
        .and_then(|b| b.field("PIACAT", "Category Code", CharClass::BcsAPlus, 5))
        .and_then(|b| b.field("TGTGEO", "Target Geographic Coordinates", CharClass::BcsAPlus, 15))
        .and_then(|b| b.field("DATUM", "Target Coordinate Datum", CharClass::BcsAPlus, 3))
        .and_then(|b| b.field("TGTNAME", "Target Name", CharClass::BcsAPlus, 38))
        .and_then(|b| b.numeric_range("PERCOVER", "Percent Coverage", 3, 0, 100))
        .expect("static descriptor")
        .build();
    TreDescriptor::new("PIATGA", description)
}

/// Register every built-in descriptor into `registry`.
pub fn register_builtins(registry: &mut TreRegistry) {
    registry.register(piatga());
}
