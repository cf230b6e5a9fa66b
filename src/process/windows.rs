use super::ProcessResolver;
use crate::models::ApplicationIdentity;
use std::mem;
use tracing::trace;
use winapi::um::{
    handleapi::{CloseHandle, INVALID_HANDLE_VALUE},
    tlhelp32::{
        CreateToolhelp32Snapshot, Process32First, Process32Next, PROCESSENTRY32,
        TH32CS_SNAPPROCESS,
    },
};
use windows::core::PWSTR;
use windows::Win32::Foundation::{CloseHandle as CloseProcessHandle, MAX_PATH};
use windows::Win32::System::Threading::{
    OpenProcess, QueryFullProcessImageNameW, PROCESS_NAME_WIN32,
    PROCESS_QUERY_LIMITED_INFORMATION,
};

pub struct WindowsProcessResolver;

impl WindowsProcessResolver {
    pub fn new() -> Self {
        Self
    }

    // Chemin complet de l'exécutable (échoue si accès refusé ou processus terminé)
    fn executable_path(&self, pid: u32) -> Option<String> {
        unsafe {
            let handle = OpenProcess(PROCESS_QUERY_LIMITED_INFORMATION, false, pid).ok()?;
            let mut buffer = [0u16; MAX_PATH as usize];
            let mut size = buffer.len() as u32;

            let path = QueryFullProcessImageNameW(
                handle,
                PROCESS_NAME_WIN32,
                PWSTR(buffer.as_mut_ptr()),
                &mut size,
            )
            .ok()
            .map(|_| String::from_utf16_lossy(&buffer[..size as usize]));

            let _ = CloseProcessHandle(handle);
            path
        }
    }

    // Nom court rapporté par le snapshot toolhelp (repli si le chemin est inaccessible)
    fn short_process_name(&self, pid: u32) -> Option<String> {
        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                return None;
            }

            let mut pe32: PROCESSENTRY32 = mem::zeroed();
            pe32.dwSize = mem::size_of::<PROCESSENTRY32>() as u32;

            let mut found = None;
            if Process32First(snapshot, &mut pe32) != 0 {
                loop {
                    if pe32.th32ProcessID == pid {
                        found = Some(self.c_string_to_string(&pe32.szExeFile));
                        break;
                    }

                    if Process32Next(snapshot, &mut pe32) == 0 {
                        break;
                    }
                }
            }
            CloseHandle(snapshot);
            found
        }
    }

    fn c_string_to_string(&self, c_str: &[i8; 260]) -> String {
        let end = c_str.iter().position(|&x| x == 0).unwrap_or(c_str.len());
        let bytes: Vec<u8> = c_str[..end].iter().map(|&x| x as u8).collect();
        String::from_utf8_lossy(&bytes).to_string()
    }
}

impl Default for WindowsProcessResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessResolver for WindowsProcessResolver {
    fn resolve(&self, pid: u32) -> Option<ApplicationIdentity> {
        if pid == 0 {
            return None;
        }

        if let Some(path) = self.executable_path(pid) {
            return ApplicationIdentity::new(&path);
        }

        let name = self.short_process_name(pid);
        trace!(pid, ?name, "chemin inaccessible, repli sur le nom court");
        name.and_then(|name| ApplicationIdentity::new(&name))
    }
}
