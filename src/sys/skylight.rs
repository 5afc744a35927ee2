// credits
// https://github.com/asmagill/hs._asm.undocumented.spaces/blob/master/CGSSpace.h.
// https://github.com/koekeishiya/yabai/blob/d55a647913ab72d8d8b348bee2d3e59e52ce4a5d/src/misc/extern.h.

use std::ffi::c_int;

use objc2::rc::Retained;
use objc2::runtime::AnyObject;
use objc2::{ClassType, msg_send};
use objc2_foundation::{NSArray, NSDictionary, NSNumber, NSString, ns_string};
use tracing::trace;

use super::snapshot::{RawDisplay, RawSnapshot, RawSpace, SnapshotError, SnapshotProvider};

#[allow(non_camel_case_types)]
pub type cid_t = i32;

#[link(name = "SkyLight", kind = "framework")]
unsafe extern "C" {
    fn SLSMainConnectionID() -> cid_t;
    fn CGSCopyManagedDisplaySpaces(cid: c_int) -> *mut NSArray;
    // Toll-free bridged with CFStringRef.
    fn SLSCopyActiveMenuBarDisplayIdentifier(cid: cid_t) -> *mut NSString;
}

fn lookup(dict: &NSDictionary, key: &NSString) -> Option<Retained<AnyObject>> {
    dict.objectForKey(key)
}

fn cast<T: ClassType>(value: &AnyObject) -> Option<&T> {
    let is_kind: bool = unsafe { msg_send![value, isKindOfClass: T::class()] };
    // SAFETY: checked against the class above.
    is_kind.then(|| unsafe { &*(value as *const AnyObject).cast::<T>() })
}

fn as_dict(value: &AnyObject) -> Option<&NSDictionary> { cast::<NSDictionary>(value) }

fn space_id(dict: &NSDictionary) -> Option<u64> {
    let value = lookup(dict, ns_string!("ManagedSpaceID"))?;
    cast::<NSNumber>(&value).map(NSNumber::as_u64)
}

fn parse_space(value: &AnyObject) -> Option<RawSpace> {
    let dict = as_dict(value)?;
    Some(RawSpace {
        id: space_id(dict)?,
        tiled: lookup(dict, ns_string!("TileLayoutManager")).is_some(),
    })
}

fn parse_display(value: &AnyObject) -> Option<RawDisplay> {
    let dict = as_dict(value)?;
    let identifier = lookup(dict, ns_string!("Display Identifier"))?;
    let identifier = cast::<NSString>(&identifier)?.to_string();
    let current_space = lookup(dict, ns_string!("Current Space"))
        .as_deref()
        .and_then(as_dict)
        .and_then(space_id);
    let spaces = lookup(dict, ns_string!("Spaces"))
        .as_deref()
        .and_then(cast::<NSArray>)
        .map(|spaces| spaces.iter().filter_map(|space| parse_space(&space)).collect())
        .unwrap_or_default();
    Some(RawDisplay { identifier, current_space, spaces })
}

/// Reads desktops straight from the window server.
#[derive(Debug, Default)]
pub struct SkyLightSpaces;

impl SnapshotProvider for SkyLightSpaces {
    fn snapshot(&self) -> Result<RawSnapshot, SnapshotError> {
        let (displays, active) = unsafe {
            let cid = SLSMainConnectionID();
            let displays = Retained::from_raw(CGSCopyManagedDisplaySpaces(cid));
            let active = Retained::from_raw(SLSCopyActiveMenuBarDisplayIdentifier(cid));
            (displays, active)
        };
        let displays = displays.ok_or_else(|| {
            SnapshotError::Provider("CGSCopyManagedDisplaySpaces returned null".into())
        })?;
        let displays: Vec<RawDisplay> =
            displays.iter().filter_map(|display| parse_display(&display)).collect();
        trace!(?displays, "managed display spaces");
        Ok(RawSnapshot {
            displays,
            active_display: active.map(|id| id.to_string()),
        })
    }
}
