/*!
Base addresses of modules loaded into the current process.

Lookups never load anything: a module that is not already mapped is reported as `None`.
*/

use std::prelude::v1::*;

use std::sync::Arc;

use crate::resolver::Resolver;
use crate::types::Address;
use crate::view::{Declare, Field, Parent};

use libloading::Library;
use log::debug;

/// A module mapped into the current process.
///
/// The module is kept loaded for as long as any clone of this value is alive.
#[derive(Clone)]
pub struct Module {
    name: String,
    base: Address,
    _library: Arc<Library>,
}

impl Module {
    /// Looks up an already loaded module by name.
    ///
    /// On unix the name is matched like `dlopen` matches it (for example `libc.so.6`), on
    /// Windows like `GetModuleHandleEx` does (for example `kernel32.dll`).
    pub fn find(name: &str) -> Option<Self> {
        let module = sys::find(name);
        match &module {
            Some(module) => debug!("module {} found at {:x}", name, module.base),
            None => debug!("module {} is not loaded", name),
        }
        module
    }

    /// The main executable of the current process.
    pub fn main() -> Option<Self> {
        let module = sys::main();
        if let Some(module) = &module {
            debug!("main module found at {:x}", module.base);
        }
        module
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address the module image starts at.
    pub fn base(&self) -> Address {
        self.base
    }

    /// An absolute resolver pointing `offset` bytes into the module image.
    pub fn resolver(&self, offset: usize) -> Resolver {
        Resolver::absolute(self.base.wrapping_add(offset))
    }

    /// A free standing field `offset` bytes into the module image.
    ///
    /// # Safety
    ///
    /// See [`Field::new`].
    pub unsafe fn field<T: Declare>(&self, offset: usize) -> Field<T> {
        Field::new(Parent::Root, self.resolver(offset))
    }
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("base", &self.base)
            .finish()
    }
}

#[cfg(unix)]
mod sys {
    use super::Module;
    use crate::types::Address;

    use std::prelude::v1::*;
    use std::sync::Arc;

    use libloading::os::unix::Library;

    pub fn find(name: &str) -> Option<Module> {
        let library =
            unsafe { Library::open(Some(name), libc::RTLD_NOLOAD | libc::RTLD_LAZY) }.ok()?;
        let base = image_base(|path| {
            path == name || path.rsplit('/').next().map_or(false, |file| file == name)
        })?;
        Some(Module {
            name: name.to_string(),
            base,
            _library: Arc::new(library.into()),
        })
    }

    pub fn main() -> Option<Module> {
        let library = Library::this();
        // the executable is always reported first, with an empty name
        let base = image_base(|path| path.is_empty())?;
        Some(Module {
            name: String::new(),
            base,
            _library: Arc::new(library.into()),
        })
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    fn image_base<F: Fn(&str) -> bool>(matches: F) -> Option<Address> {
        use std::ffi::CStr;
        use std::os::raw::{c_int, c_void};

        struct Search<'a> {
            matches: &'a dyn Fn(&str) -> bool,
            found: Option<Address>,
        }

        unsafe extern "C" fn visit(
            info: *mut libc::dl_phdr_info,
            _size: libc::size_t,
            data: *mut c_void,
        ) -> c_int {
            let search = &mut *(data as *mut Search);
            let info = &*info;

            let path = if info.dlpi_name.is_null() {
                ""
            } else {
                CStr::from_ptr(info.dlpi_name).to_str().unwrap_or("")
            };
            if !(search.matches)(path) {
                return 0;
            }

            // load bias plus the lowest loaded segment, non PIE executables have a zero bias
            let headers = std::slice::from_raw_parts(info.dlpi_phdr, info.dlpi_phnum as usize);
            let lowest = headers
                .iter()
                .filter(|header| header.p_type == libc::PT_LOAD)
                .map(|header| header.p_vaddr as usize)
                .min()
                .unwrap_or(0);
            search.found = Some(Address::from((info.dlpi_addr as usize).wrapping_add(lowest)));
            1
        }

        let mut search = Search {
            matches: &matches,
            found: None,
        };
        unsafe {
            libc::dl_iterate_phdr(Some(visit), &mut search as *mut Search as *mut c_void);
        }
        search.found
    }

    #[cfg(not(any(target_os = "linux", target_os = "android")))]
    fn image_base<F: Fn(&str) -> bool>(_matches: F) -> Option<Address> {
        log::debug!("module base lookup is not available on this platform");
        None
    }
}

#[cfg(windows)]
mod sys {
    use super::Module;
    use crate::types::Address;

    use std::prelude::v1::*;
    use std::sync::Arc;

    use libloading::os::windows::Library;

    // a module handle is the address its image is mapped at
    fn wrap(name: String, library: Library) -> Module {
        let handle = library.into_raw();
        let base = Address::from(handle as usize);
        Module {
            name,
            base,
            _library: Arc::new(unsafe { Library::from_raw(handle) }.into()),
        }
    }

    #[allow(unused_unsafe)]
    pub fn find(name: &str) -> Option<Module> {
        let library = unsafe { Library::open_already_loaded(name) }.ok()?;
        Some(wrap(name.to_string(), library))
    }

    pub fn main() -> Option<Module> {
        let library = Library::this().ok()?;
        Some(wrap(String::new(), library))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_module_is_none() {
        assert!(Module::find("memview-module-that-does-not-exist.so").is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn main_module_is_an_elf_image() {
        let main = Module::main().unwrap();
        assert!(main.base().is_valid());
        assert!(main.name().is_empty());

        let magic = unsafe { main.field::<[u8; 4]>(0) };
        assert_eq!(magic.get(), *b"\x7fELF");
        assert_eq!(magic.address(), main.base());
    }

    #[test]
    fn resolver_offsets_into_image() {
        if let Some(main) = Module::main() {
            assert_eq!(
                unsafe { main.resolver(0x40).resolve(Address::NULL) },
                main.base().wrapping_add(0x40)
            );
        }
    }
}
